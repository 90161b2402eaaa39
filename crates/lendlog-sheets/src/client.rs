//! [`SheetsClient`], the HTTP implementation of [`Backend`].

use std::{sync::Arc, time::Duration};

use chrono::FixedOffset;
use lendlog_core::{
  backend::Backend,
  movement::{Movement, Person},
};
use reqwest::Client;

use crate::{
  config::SheetsConfig,
  decode::{decode_log, decode_roster},
  error::{Error, Result},
  form::form_fields,
  gviz::{Table, parse_envelope},
};

/// Reads the sheets and posts to the form.
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct SheetsClient {
  client: Client,
  config: Arc<SheetsConfig>,
  offset: FixedOffset,
}

impl SheetsClient {
  pub fn new(config: SheetsConfig) -> Result<Self> {
    config.validate()?;
    let offset = config.offset()?;
    let client = Client::builder()
      .timeout(Duration::from_millis(config.request_timeout_ms))
      .build()?;
    Ok(Self { client, config: Arc::new(config), offset })
  }

  pub fn config(&self) -> &SheetsConfig { &self.config }

  /// `GET` a gviz endpoint and unwrap its table.
  async fn fetch_table(&self, url: &str) -> Result<Table> {
    let resp = self.client.get(url).send().await?;
    let status = resp.status();
    if !status.is_success() {
      return Err(Error::Status {
        status: status.as_u16(),
        url:    url.to_string(),
      });
    }
    let body = resp.text().await?;
    parse_envelope(&body)
  }

  pub async fn roster(&self) -> Result<Vec<Person>> {
    let table = self.fetch_table(&self.config.roster_url).await?;
    let people = decode_roster(&table)?;
    tracing::debug!(people = people.len(), "roster fetched");
    Ok(people)
  }

  pub async fn log(&self) -> Result<Vec<Movement>> {
    let table = self.fetch_table(&self.config.log_url).await?;
    let movements = decode_log(&table, &self.config.markers, self.offset)?;
    tracing::debug!(movements = movements.len(), "log fetched");
    Ok(movements)
  }

  /// Post `movement` to the form. Only a transport failure is an error; the
  /// form's status code says nothing reliable about whether the row landed.
  pub async fn post(&self, movement: &Movement) -> Result<()> {
    let fields =
      form_fields(movement, &self.config.entries, &self.config.markers);
    let resp = self
      .client
      .post(&self.config.form_url)
      .form(&fields)
      .send()
      .await?;

    let status = resp.status();
    if status.is_success() {
      tracing::debug!(unit = %movement.unit_id, "form accepted submission");
    } else {
      tracing::warn!(
        unit = %movement.unit_id,
        status = status.as_u16(),
        "form answered with a non-success status"
      );
    }
    Ok(())
  }
}

impl Backend for SheetsClient {
  async fn fetch_roster(&self) -> lendlog_core::Result<Vec<Person>> {
    Ok(self.roster().await?)
  }

  async fn fetch_log(&self) -> lendlog_core::Result<Vec<Movement>> {
    Ok(self.log().await?)
  }

  async fn submit(&self, movement: &Movement) -> lendlog_core::Result<()> {
    self
      .post(movement)
      .await
      .map_err(|e| lendlog_core::Error::Dispatch(e.to_string()))
  }
}
