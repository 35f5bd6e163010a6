// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
#![deny(elided_lifetimes_in_paths)]
#![warn(
    rust_2018_idioms,
    future_incompatible,
    unused,
    unused_lifetimes,
    unused_qualifications,
    unused_results,
    anonymous_parameters,
    deprecated_in_future,
    elided_lifetimes_in_paths,
    explicit_outlives_requirements,
    keyword_idents,
    macro_use_extern_crate,
    missing_doc_code_examples,
    private_doc_tests,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::unseparated_literal_suffix,
    clippy::decimal_literal_representation,
    clippy::single_char_lifetime_names,
    clippy::fallible_impl_from,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::wildcard_enum_match_arm,
    clippy::deref_by_slicing,
    clippy::default_numeric_fallback,
    clippy::shadow_reuse,
    clippy::clone_on_ref_ptr,
    clippy::todo,
    clippy::string_add,
    clippy::use_debug,
    clippy::future_not_send
)]
#![cfg_attr(not(test), warn(clippy::panic_in_result_fn))]

mod api;
mod client;
mod command;
mod config;
mod credential;
mod error;
mod metadata;
mod model;
mod password;
mod session;
mod storage;
mod sync;
mod transport;

use std::{path::PathBuf, process, time::Duration};

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use client::Client;
use config::{Config, CredentialScheme};
use credential::Credential;
use error::Result;
use log::{debug, error, warn};
use session::Reason;
use transport::{Backend, HttpBackend};
use url::Url;

#[derive(Debug, Subcommand)]
enum Command {
    Login(command::login::Command),
    Signup(command::signup::Command),
    Logout(command::logout::Command),
    Whoami(command::whoami::Command),
    Movies(command::movies::Command),
    Genres(command::genres::Command),
}

#[async_trait]
impl command::Command for Command {
    async fn execute<B: Backend>(self, client: &Client<B>) -> Result<()> {
        match self {
            Self::Login(cmd) => cmd.execute(client).await,
            Self::Signup(cmd) => cmd.execute(client).await,
            Self::Logout(cmd) => cmd.execute(client).await,
            Self::Whoami(cmd) => cmd.execute(client).await,
            Self::Movies(cmd) => cmd.execute(client).await,
            Self::Genres(cmd) => cmd.execute(client).await,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// The base URL of the Vidly API. Routes are resolved relative to it.
    #[arg(long, env = "VIDLY_URL", default_value = "http://localhost:3900/", value_parser = Url::parse)]
    url: Url,

    /// The request header that carries the session credential.
    #[arg(long, env = "VIDLY_CREDENTIAL_HEADER", default_value = "Authorization")]
    credential_header: String,

    /// The scheme written before the credential in its header. An empty value
    /// sends the credential on its own.
    #[arg(long, env = "VIDLY_CREDENTIAL_PREFIX", default_value = "Bearer")]
    credential_prefix: String,

    /// The response header in which the server may hand out a new
    /// credential at login or signup.
    #[arg(long, env = "VIDLY_ISSUED_CREDENTIAL_HEADER", default_value = "x-auth-token")]
    issued_credential_header: String,

    /// How long to wait for each request, in seconds.
    #[arg(long, env = "VIDLY_TIMEOUT", default_value_t = 30)]
    timeout: u64,

    /// Keep the session credential in memory only, so every invocation starts
    /// logged out.
    #[arg(long)]
    no_persist_credential: bool,

    /// The path to the Pinentry program to use when asking for a password.
    #[arg(long, value_hint = clap::ValueHint::ExecutablePath)]
    pinentry_program: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

async fn get_credential_storage(args: &Args) -> Box<dyn storage::Storage<Credential>> {
    if !args.no_persist_credential {
        #[cfg(feature = "secret-service")]
        match storage::SecretService::for_origin(&args.url).await {
            Ok(secret_service_storage) => return Box::new(secret_service_storage),
            Err(e) => {
                warn!("We need to fall back to unencrypted file storage because we can't connect to the secret service: {}", e);
            }
        }

        #[cfg(feature = "keychain")]
        match storage::Keychain::for_origin(&args.url) {
            Ok(keychain_storage) => return Box::new(keychain_storage),
            Err(e) => {
                warn!("We need to fall back to unencrypted file storage because we can't connect to Keychain: {}", e);
            }
        }

        if let Some(file_storage) = storage::File::for_origin(&args.url) {
            return Box::new(file_storage);
        }
        warn!("We have nowhere to keep the credential, so it will only last as long as this process");
    }

    Box::new(storage::Memory::<Credential>::new())
}

async fn run(args: Args) -> Result<()> {
    let prompt: Vec<Box<dyn password::Prompt>> = vec![
        Box::new(args.pinentry_program.clone().map_or_else(
            password::PinentryPrompt::new,
            password::PinentryPrompt::new_with_executable,
        )),
        Box::new(password::RpasswordPrompt),
    ];

    let config = Config::new(args.url.clone())
        .with_scheme(CredentialScheme::new(
            &args.credential_header,
            &args.credential_prefix,
            &args.issued_credential_header,
        )?)
        .with_timeout(Duration::from_secs(args.timeout));
    let store = credential::Store::new(get_credential_storage(&args).await);
    let client = Client::new(HttpBackend::new(&config)?, store, &config, Box::new(prompt));

    let restored = client.session.restore().await;
    if restored.reason() == Some(&Reason::SessionExpired) {
        warn!("Your session has expired. Please log in again.");
    } else if restored.is_anonymous() {
        debug!("Starting without a session");
    }

    let mut session = client.session.subscribe();
    let result = command::Command::execute(args.command, &client).await;
    if session.has_changed().unwrap_or(false)
        && session.borrow_and_update().reason() == Some(&Reason::SessionExpired)
    {
        warn!("The server ended your session. Please log in again.");
    }

    result
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let logger_env = env_logger::Env::new()
        .filter_or("VIDLY_LOG", "warn")
        .write_style("VIDLY_LOG_STYLE");
    env_logger::Builder::from_env(logger_env).init();

    if let Err(e) = run(Args::parse()).await {
        if let error::Error::Sync(ref failure) = e {
            error!("We could not {} movies: {}", failure.operation(), failure);
        } else {
            error!("We encountered an error: {}", e);
        }
        process::exit(1);
    };
}
