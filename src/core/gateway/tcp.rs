// src/core/gateway/tcp.rs

//! A RESP client gateway talking to a SpinelDB (or any Redis-compatible) server.

use super::CommandGateway;
use crate::config::ClientConfig;
use crate::core::commands::RemoteCommand;
use crate::core::commands::reply::{expect_ok, reject_error};
use crate::core::protocol::{RespFrame, RespFrameCodec};
use crate::core::{CollectionError, CollectionResult};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::codec::Framed;
use tracing::{debug, trace, warn};

type Connection = Framed<TcpStream, RespFrameCodec>;

/// Sends commands over one shared connection, in the order callers acquire it.
///
/// The connection is opened lazily and dropped after any transport fault; the
/// next command reconnects. Blocking commands run on a connection of their own
/// so they never hold up other callers. Nothing is retried here.
#[derive(Debug)]
pub struct TcpGateway {
    address: String,
    username: Option<String>,
    password: Option<String>,
    database: usize,
    connect_timeout: Duration,
    response_timeout: Duration,
    shared: Mutex<Option<Connection>>,
}

impl TcpGateway {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            address: config.address(),
            username: config.username.clone(),
            password: config.password.clone(),
            database: config.database,
            connect_timeout: config.connect_timeout,
            response_timeout: config.response_timeout,
            shared: Mutex::new(None),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Opens a connection and runs the `AUTH`/`SELECT` handshake on it.
    async fn connect(&self) -> CollectionResult<Connection> {
        let stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(&self.address))
            .await
            .map_err(|_| CollectionError::Timeout(format!("connection to {}", self.address)))??;
        stream.set_nodelay(true)?;
        let mut connection = Framed::new(stream, RespFrameCodec);

        if let Some(password) = &self.password {
            let auth = RemoteCommand::Auth {
                username: self.username.clone(),
                password: password.clone(),
            };
            let reply = self.round_trip(&mut connection, &auth).await?;
            expect_ok("AUTH", reject_error(reply)?)?;
        }
        if self.database != 0 {
            let select = RemoteCommand::Select { db: self.database };
            let reply = self.round_trip(&mut connection, &select).await?;
            expect_ok("SELECT", reject_error(reply)?)?;
        }

        debug!(address = %self.address, database = self.database, "connected");
        Ok(connection)
    }

    /// How long to wait for the reply to `command`. `None` waits forever.
    fn reply_timeout(&self, command: &RemoteCommand) -> Option<Duration> {
        match command.blocking_timeout() {
            Some(0) => None,
            Some(secs) => Some(self.response_timeout + Duration::from_secs(secs)),
            None => Some(self.response_timeout),
        }
    }

    async fn round_trip(
        &self,
        connection: &mut Connection,
        command: &RemoteCommand,
    ) -> CollectionResult<RespFrame> {
        connection.send(command.to_frame()).await?;
        let next = match self.reply_timeout(command) {
            Some(wait) => tokio::time::timeout(wait, connection.next())
                .await
                .map_err(|_| CollectionError::Timeout(format!("reply to {}", command.name())))?,
            None => connection.next().await,
        };
        match next {
            Some(frame) => frame,
            None => Err(CollectionError::ConnectionClosed),
        }
    }

    async fn execute_shared(&self, command: &RemoteCommand) -> CollectionResult<RespFrame> {
        let mut guard = self.shared.lock().await;
        if guard.is_none() {
            *guard = Some(self.connect().await?);
        }
        let Some(connection) = guard.as_mut() else {
            return Err(CollectionError::ConnectionClosed);
        };

        match self.round_trip(connection, command).await {
            Ok(frame) => Ok(frame),
            Err(e) => {
                if e.is_transport() {
                    // A late reply would desynchronize the stream, so the
                    // connection cannot be reused.
                    warn!(
                        address = %self.address,
                        command = command.name(),
                        "dropping connection: {}",
                        e
                    );
                    *guard = None;
                }
                Err(e)
            }
        }
    }

    async fn execute_dedicated(&self, command: &RemoteCommand) -> CollectionResult<RespFrame> {
        let mut connection = self.connect().await?;
        let result = self.round_trip(&mut connection, command).await;
        if let Err(e) = &result {
            warn!(
                address = %self.address,
                command = command.name(),
                "blocking command failed: {}",
                e
            );
        }
        result
    }
}

#[async_trait]
impl CommandGateway for TcpGateway {
    async fn execute(&self, command: RemoteCommand) -> CollectionResult<RespFrame> {
        trace!(command = command.name(), address = %self.address, "sending");
        if command.blocking_timeout().is_some() {
            self.execute_dedicated(&command).await
        } else {
            self.execute_shared(&command).await
        }
    }
}
