use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::availability::AvailabilityService;
use crate::booking::api_types::{ApiHoliday, ApiSlotCheckResponse};
use crate::booking::types::{DateKey, HolidayRecord, SlotCheck, SlotTime};
use crate::config::Config;

/// Booking backend REST client
#[derive(Clone)]
pub struct BookingClient {
  http: reqwest::Client,
  base: Url,
  token: Option<String>,
}

impl BookingClient {
  pub fn new(config: &Config) -> Result<Self> {
    Self::with_base(
      &config.backend.url,
      Config::get_api_token(),
      Duration::from_secs(config.backend.timeout_secs),
    )
  }

  pub fn with_base(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
    let mut base =
      Url::parse(base_url).map_err(|e| eyre!("Invalid backend URL '{}': {}", base_url, e))?;
    // Url::join replaces the last segment unless the path ends with '/'
    if !base.path().ends_with('/') {
      let path = format!("{}/", base.path());
      base.set_path(&path);
    }

    let http = reqwest::Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { http, base, token })
  }

  /// Host part of the backend URL, for display
  pub fn host(&self) -> &str {
    self.base.host_str().unwrap_or("")
  }

  fn endpoint(&self, path: &str) -> Result<Url> {
    self
      .base
      .join(path)
      .map_err(|e| eyre!("Failed to build URL for {}: {}", path, e))
  }

  async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
    debug!(%url, "GET");
    let mut request = self.http.get(url.clone());
    if let Some(token) = &self.token {
      request = request.bearer_auth(token);
    }

    let response = request
      .send()
      .await
      .map_err(|e| eyre!("Request to {} failed: {}", url.path(), e))?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(eyre!(
        "{} returned {}: {}",
        url.path(),
        status,
        body.trim()
      ));
    }

    response
      .json::<T>()
      .await
      .map_err(|e| eyre!("Failed to parse response from {}: {}", url.path(), e))
  }
}

#[async_trait]
impl AvailabilityService for BookingClient {
  async fn check_slot(&self, date: DateKey, time: SlotTime, party_size: u32) -> Result<SlotCheck> {
    let mut url = self.endpoint("slots/check")?;
    url
      .query_pairs_mut()
      .append_pair("date", &date.to_string())
      .append_pair("time", &time.to_string())
      .append_pair("persons", &party_size.to_string());

    let response: ApiSlotCheckResponse = self
      .get_json(url)
      .await
      .map_err(|e| eyre!("Failed to check slot {} {}: {}", date, time, e))?;

    Ok(response.into())
  }

  async fn query_holidays(
    &self,
    year_from: i32,
    year_to: i32,
  ) -> Result<BTreeMap<DateKey, HolidayRecord>> {
    let mut url = self.endpoint("holidays")?;
    url
      .query_pairs_mut()
      .append_pair("from", &year_from.to_string())
      .append_pair("to", &year_to.to_string());

    let response: Vec<ApiHoliday> = self.get_json(url).await?;

    Ok(
      response
        .into_iter()
        .map(HolidayRecord::from)
        .map(|record| (record.date, record))
        .collect(),
    )
  }
}
