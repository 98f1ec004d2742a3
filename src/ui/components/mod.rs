mod command_input;
mod input;
mod key_result;
mod slot_form;

pub use command_input::{CommandEvent, CommandInput};
pub use key_result::KeyResult;
pub use slot_form::{FormEvent, SlotForm};
