// File: ./src/client/google.rs
//! `CalendarStore` over the Google Calendar v3 REST API.
use crate::calendar::CalendarStore;
use crate::client::http::{HttpClient, HttpResponse, encode_form};
use crate::config::GoogleConfig;
use crate::error::StoreError;
use crate::model::CalendarEntry;
use crate::model::entry::{DATE_TIME_FORMAT, SOURCE_ID_PROPERTY};
use chrono::{DateTime, Utc};
use http::Method;
use serde::Deserialize;

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Deserialize)]
struct EventList {
    #[serde(default)]
    items: Vec<CalendarEntry>,
}

#[derive(Debug, Clone)]
pub struct GoogleCalendar {
    http: HttpClient,
    api_base: String,
    calendar_id: String,
    bearer: String,
}

fn check(response: HttpResponse) -> Result<String, StoreError> {
    if response.is_success() {
        Ok(response.body)
    } else {
        Err(StoreError::Status {
            status: response.status.as_u16(),
            body: response.body,
        })
    }
}

impl GoogleCalendar {
    /// Exchanges the configured refresh token for an access token.
    pub async fn connect(http: HttpClient, config: &GoogleConfig) -> Result<Self, StoreError> {
        log::info!("Authenticating against Google Calendar...");
        let response = http
            .send(
                Method::POST,
                &config.token_url,
                None,
                Some((
                    "application/x-www-form-urlencoded",
                    encode_form(&[
                        ("grant_type", "refresh_token"),
                        ("client_id", config.client_id.as_str()),
                        ("client_secret", config.client_secret.as_str()),
                        ("refresh_token", config.refresh_token.as_str()),
                    ]),
                )),
            )
            .await?;
        let status = response.status;
        let token: TokenResponse = serde_json::from_str(&response.body)?;
        let access_token = match token.access_token {
            Some(t) if status.is_success() => t,
            _ => {
                return Err(StoreError::Auth(format!(
                    "{} ({}): {}",
                    token.error.unwrap_or_else(|| "no access token".into()),
                    status,
                    token.error_description.unwrap_or_default()
                )));
            }
        };
        Ok(Self::with_token(
            http,
            &config.api_base,
            &config.calendar_id,
            &access_token,
        ))
    }

    /// Builds a client around an already issued access token.
    pub fn with_token(http: HttpClient, api_base: &str, calendar_id: &str, token: &str) -> Self {
        Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            calendar_id: calendar_id.to_string(),
            bearer: format!("Bearer {}", token),
        }
    }

    fn events_url(&self) -> String {
        format!(
            "{}/calendars/{}/events",
            self.api_base,
            urlencoding::encode(&self.calendar_id)
        )
    }

    fn event_url(&self, entry_id: &str) -> String {
        format!("{}/{}", self.events_url(), urlencoding::encode(entry_id))
    }

    async fn list(&self, query: &[(&str, &str)]) -> Result<Vec<CalendarEntry>, StoreError> {
        let url = format!("{}?{}", self.events_url(), encode_form(query));
        let body = check(self.http.get(&url, &self.bearer).await?)?;
        let list: EventList = serde_json::from_str(&body)?;
        Ok(list.items)
    }

    async fn write(
        &self,
        method: Method,
        url: &str,
        payload: &CalendarEntry,
    ) -> Result<CalendarEntry, StoreError> {
        let json = serde_json::to_string(payload)?;
        let body = check(self.http.send_json(method, url, &self.bearer, json).await?)?;
        Ok(serde_json::from_str(&body)?)
    }
}

impl CalendarStore for GoogleCalendar {
    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Vec<CalendarEntry>, StoreError> {
        let filter = format!("{}={}", SOURCE_ID_PROPERTY, external_id);
        self.list(&[("privateExtendedProperty", filter.as_str())]).await
    }

    async fn insert(&self, payload: &CalendarEntry) -> Result<CalendarEntry, StoreError> {
        self.write(Method::POST, &self.events_url(), payload).await
    }

    async fn update(
        &self,
        entry_id: &str,
        payload: &CalendarEntry,
    ) -> Result<CalendarEntry, StoreError> {
        self.write(Method::PUT, &self.event_url(entry_id), payload)
            .await
    }

    async fn delete(&self, entry_id: &str) -> Result<(), StoreError> {
        check(self.http.delete(&self.event_url(entry_id), &self.bearer).await?)?;
        Ok(())
    }

    async fn list_future(
        &self,
        from: DateTime<Utc>,
        max_results: usize,
    ) -> Result<Vec<CalendarEntry>, StoreError> {
        let time_min = format!("{}Z", from.format(DATE_TIME_FORMAT));
        let max_results = max_results.to_string();
        self.list(&[
            ("timeMin", time_min.as_str()),
            ("maxResults", max_results.as_str()),
            ("singleEvents", "true"),
            ("orderBy", "startTime"),
        ])
        .await
    }
}
