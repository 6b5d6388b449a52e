/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use reqwest::{
    header::{HeaderMap, HeaderValue, InvalidHeaderValue},
    Certificate, Client, StatusCode,
};
use serde::{Deserialize, Serialize};
use tokio::fs;

/// Anything that can carry a SOAP body to the vim25 endpoint and return
/// the raw response document.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    async fn request(&self, body: String) -> Result<String, SoapError>;
}

#[derive(Debug)]
pub struct SoapClient {
    endpoint: String,
    client: Client,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CertType {
    PEM,
    DER,
}

pub struct SoapClientBuilder {
    endpoint: String,
    api_version: String,
    certificate: Option<(CertType, PathBuf)>,
    disable_certificate_verification: bool,
    disable_hostname_verification: bool,
    timeout: Option<Duration>,
}

impl SoapClient {
    fn envelope(body: String) -> String {
        format!(
            r#"<SOAP-ENV:Envelope
						xmlns:SOAP-ENC="http://schemas.xmlsoap.org/soap/encoding/"
						xmlns:SOAP-ENV="http://schemas.xmlsoap.org/soap/envelope/"
						xmlns:soapenc="http://schemas.xmlsoap.org/soap/encoding/"
						xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/"
						xmlns:xsd="http://www.w3.org/2001/XMLSchema"
						xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
					<SOAP-ENV:Header></SOAP-ENV:Header>
					{}
				</SOAP-ENV:Envelope>"#,
            body
        )
    }

    pub fn builder(endpoint: String) -> SoapClientBuilder {
        SoapClientBuilder {
            endpoint,
            api_version: String::from("5.0"),
            certificate: None,
            disable_certificate_verification: false,
            disable_hostname_verification: false,
            timeout: None,
        }
    }
}

impl SoapClientBuilder {
    pub fn api_version(mut self, api_version: &str) -> Self {
        self.api_version = api_version.to_string();
        self
    }

    pub fn certificate(
        mut self,
        certificate: Option<(CertType, PathBuf)>,
    ) -> Self {
        self.certificate = certificate;
        self
    }

    pub fn disable_certificate_verification(mut self, disable: bool) -> Self {
        self.disable_certificate_verification = disable;
        self
    }

    pub fn disable_hostname_verification(mut self, disable: bool) -> Self {
        self.disable_hostname_verification = disable;
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn build(self) -> Result<SoapClient, SoapError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "SOAPAction",
            HeaderValue::from_str(&format!("urn:vim25/{}", self.api_version))?,
        );
        headers.insert(
            "Content-Type",
            HeaderValue::from_static("text/xml; charset=\"utf-8\""),
        );
        let mut client = Client::builder()
            .user_agent("SmartAgent")
            .default_headers(headers)
            .cookie_store(true)
            .danger_accept_invalid_certs(self.disable_certificate_verification)
            .danger_accept_invalid_hostnames(
                self.disable_hostname_verification,
            );

        if let Some(timeout) = self.timeout {
            client = client.timeout(timeout);
        }

        if let Some((cert_type, cert_path)) = &self.certificate {
            info!("loading certificate ({:?}): {:?}", cert_type, cert_path);
            let cert = fs::read(cert_path).await?;
            client = client.add_root_certificate(match cert_type {
                CertType::PEM => Certificate::from_pem(&cert)?,
                CertType::DER => Certificate::from_der(&cert)?,
            });
        }
        let client = client.build()?;

        Ok(SoapClient {
            client,
            endpoint: self.endpoint,
        })
    }
}

#[async_trait]
impl Transport for SoapClient {
    async fn request(&self, body: String) -> Result<String, SoapError> {
        let body = SoapClient::envelope(body);
        let response =
            self.client.post(&self.endpoint).body(body).send().await?;
        let status = response.status();
        let text = response.text().await?;
        // vim25 reports faults with a 500 and a soap fault body
        if !status.is_success() && status != StatusCode::INTERNAL_SERVER_ERROR
        {
            debug!("request failed ({}): {}", status, text);
            return Err(SoapError::Status(status));
        }
        Ok(text)
    }
}

/// A SOAP fault returned by the server, kept as the server reported it.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct SoapFault {
    pub code: String,
    pub message: String,
    /// The vim25 fault type from the fault detail, e.g. `InvalidProperty`.
    pub fault_type: Option<String>,
}

impl SoapFault {
    pub fn is_invalid_property(&self) -> bool {
        self.fault_type.as_deref() == Some("InvalidProperty")
    }

    pub fn is_not_authenticated(&self) -> bool {
        self.fault_type.as_deref() == Some("NotAuthenticated")
    }
}

impl fmt::Display for SoapFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.fault_type {
            Some(typ) => write!(f, "{} ({}): {}", self.code, typ, self.message),
            None => write!(f, "{}: {}", self.code, self.message),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SoapError {
    #[error("Request to host failed: {0}")]
    ReqwestError(#[from] reqwest::Error),
    #[error("Host responded with status {0}")]
    Status(StatusCode),
    #[error("Invalid header value: {0}")]
    Header(#[from] InvalidHeaderValue),
    #[error("{0:?}")]
    IO(#[from] std::io::Error),
}
