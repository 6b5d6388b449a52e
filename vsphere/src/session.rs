/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use log::{debug, info, trace, warn};

use crate::config::{Config, Credentials, TaskOptions};
use crate::error::{Error, Result};
use crate::inventory::Inventory;
use crate::property_collector::PropertyCollector;
use crate::requests::{Login, Logout, Request, RetrieveServiceContent};
use crate::soap::{SoapClient, SoapFault, Transport};
use crate::spec::RetrieveOptions;
use crate::task::TaskMonitor;
use crate::types::{
    ApiType, ManagedObjectReference, ServiceContent, UserSession,
};

/// A connection to a vCenter server or ESX host.
#[derive(Debug)]
pub struct VimClient {
    transport: Arc<dyn Transport>,
    service_content: ServiceContent,
    session: Mutex<Option<Session>>,
    session_timeout: chrono::Duration,
    retrieve_options: RetrieveOptions,
    task_options: TaskOptions,
}

#[derive(Debug)]
struct Session {
    user: UserSession,
    last_active: DateTime<Utc>,
}

impl VimClient {
    pub async fn connect(config: &Config) -> Result<Self> {
        let endpoint = config.endpoint().await?;
        info!("connecting to {}", endpoint);
        let client = SoapClient::builder(endpoint)
            .api_version(config.api_version())
            .certificate(config.certificate.clone())
            .disable_certificate_verification(
                config.disable_certificate_verification.unwrap_or(false),
            )
            .disable_hostname_verification(
                config.disable_hostname_verification.unwrap_or(false),
            )
            .timeout(config.request_timeout())
            .build()
            .await?;
        Self::with_transport(Arc::new(client), config).await
    }

    /// Retrieve the service content over an existing transport and log in
    /// when credentials are configured.
    pub async fn with_transport(
        transport: Arc<dyn Transport>,
        config: &Config,
    ) -> Result<Self> {
        let service_content =
            call(&*transport, &RetrieveServiceContent).await?;
        info!(
            "connected to {} (api {}, {})",
            service_content.about.full_name,
            service_content.about.api_version,
            service_content.about.api_type
        );

        let client = Self {
            transport,
            service_content,
            session: Mutex::new(None),
            session_timeout: config.session_timeout(),
            retrieve_options: RetrieveOptions::max_objects(
                config.retrieve_max_objects,
            ),
            task_options: config.task,
        };

        if let Some(credentials) = &config.credentials {
            client.login(credentials).await?;
        }

        Ok(client)
    }

    async fn login(&self, credentials: &Credentials) -> Result<()> {
        let password = credentials.password.as_ref().ok_or_else(|| {
            Error::MissingPassword(credentials.username.clone())
        })?;
        let session_manager = self
            .service_content
            .session_manager
            .clone()
            .ok_or(Error::MissingManager("sessionManager"))?;
        let user = self
            .call(&Login {
                session_manager,
                username: credentials.username.clone(),
                password: password.clone(),
                locale: None,
            })
            .await
            .map_err(|e| Error::Login(Box::new(e)))?;
        info!("logged in as {} (session {})", user.user_name, user.key);
        *self.lock_session() = Some(Session {
            user,
            last_active: Utc::now(),
        });
        Ok(())
    }

    /// Send a request and parse its response. A successful call counts as
    /// session activity; a `NotAuthenticated` fault drops the session.
    pub async fn call<R: Request>(&self, req: &R) -> Result<R::Response> {
        match call(&*self.transport, req).await {
            Ok(res) => {
                if let Some(session) = self.lock_session().as_mut() {
                    session.last_active = Utc::now();
                }
                Ok(res)
            }
            Err(e) => {
                if e.fault().map_or(false, SoapFault::is_not_authenticated) {
                    if let Some(session) = self.lock_session().take() {
                        warn!(
                            "session of {} is no longer authenticated",
                            session.user.user_name
                        );
                    }
                }
                Err(e)
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        match self.lock_session().as_ref() {
            Some(session) => {
                Utc::now() < session.last_active + self.session_timeout
            }
            None => false,
        }
    }

    /// Log out if connected. The local session is dropped even when the
    /// logout call fails.
    pub async fn disconnect(&self) -> Result<()> {
        let res = match self.is_connected() {
            true => match &self.service_content.session_manager {
                Some(session_manager) => {
                    self.call(&Logout {
                        session_manager: session_manager.clone(),
                    })
                    .await
                }
                None => Err(Error::MissingManager("sessionManager")),
            },
            false => Ok(()),
        };
        if let Some(session) = self.lock_session().take() {
            match &res {
                Ok(()) => info!("closed session of {}", session.user.user_name),
                Err(e) => warn!(
                    "logout of {} failed: {}",
                    session.user.user_name, e
                ),
            }
        }
        res
    }

    pub fn user_session(&self) -> Option<UserSession> {
        self.lock_session().as_ref().map(|s| s.user.clone())
    }

    pub fn service_content(&self) -> &ServiceContent {
        &self.service_content
    }

    pub fn root_folder(&self) -> &ManagedObjectReference {
        &self.service_content.root_folder
    }

    pub fn api_type(&self) -> &ApiType {
        &self.service_content.about.api_type
    }

    pub fn assert_vcenter(&self) -> Result<()> {
        self.assert_api_type(ApiType::VirtualCenter)
    }

    pub fn assert_host(&self) -> Result<()> {
        self.assert_api_type(ApiType::HostAgent)
    }

    fn assert_api_type(&self, expected: ApiType) -> Result<()> {
        match self.api_type() == &expected {
            true => Ok(()),
            false => Err(Error::WrongApiType {
                expected,
                actual: self.api_type().clone(),
            }),
        }
    }

    pub fn retrieve_options(&self) -> RetrieveOptions {
        self.retrieve_options
    }

    pub fn task_options(&self) -> &TaskOptions {
        &self.task_options
    }

    pub fn property_collector(&self) -> PropertyCollector<'_> {
        PropertyCollector::new(self)
    }

    pub fn task_monitor(&self) -> TaskMonitor<'_> {
        TaskMonitor::new(self)
    }

    pub fn inventory(&self) -> Inventory<'_> {
        Inventory::new(self)
    }

    fn lock_session(&self) -> MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn call<R: Request>(
    transport: &dyn Transport,
    req: &R,
) -> Result<R::Response> {
    let body = req.body()?;
    match req.loggable() {
        true => debug!("calling {}: {}", req.method(), body),
        false => debug!("calling {}", req.method()),
    }
    let data = transport.request(body).await?;
    trace!("{} response: {}", req.method(), data);
    R::parse(&data)
}
