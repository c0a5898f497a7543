//!
//! quipd  -- Captions on demand, over HTTP
//!

             extern crate clap;
             extern crate exitcode;
             extern crate futures;
             extern crate hyper;
#[macro_use] extern crate lazy_static;
             extern crate mime;
             extern crate quip;
             extern crate serde;
#[macro_use] extern crate serde_derive;
             extern crate serde_json;
             extern crate serde_qs;
             extern crate slog;
             extern crate slog_async;
             extern crate slog_envlogger;
             extern crate slog_scope;
             extern crate slog_stdlog;
             extern crate slog_term;
             extern crate thiserror;
             extern crate tokio;

// `log` is declared last, so that its macros are the ones in scope
// rather than the similarly named ones from other crates.
#[macro_use] extern crate log;

#[cfg(test)]              extern crate image;
#[cfg(test)] #[macro_use] extern crate spectral;
#[cfg(test)]              extern crate tempfile;


mod args;
mod handlers;
mod logging;
mod service;

#[cfg(test)]
mod testing;


use std::env;
use std::error::Error;
use std::io::{self, Write};
use std::net::SocketAddr;
use std::process::exit;
use std::sync::Arc;
use std::time::Duration;

use futures::channel::oneshot;
use futures::future::FutureExt;
use hyper::Server;
use hyper::server::conn::AddrStream;
use hyper::service::{make_service_fn, service_fn};
use quip::{Catalog, EngineBuilder, FileStorage, FontLoader, OpenAiGenerator, Pipeline,
           TemplateLoader};
use tokio::runtime;

use crate::args::{ArgsError, Options};
use crate::handlers::Captioner;
use crate::service::Quip;


lazy_static! {
    /// Application / package name, as filled out by Cargo.
    static ref NAME: &'static str = option_env!("CARGO_PKG_NAME").unwrap_or("quipd");

    /// Application version, as filled out by Cargo.
    static ref VERSION: Option<&'static str> = option_env!("CARGO_PKG_VERSION");
}


fn main() {
    let opts = args::parse().unwrap_or_else(|e| {
        print_args_error(e);
        exit(exitcode::USAGE)
    });

    let _logging = logging::init(opts.verbosity).unwrap_or_else(|e| {
        let _ = writeln!(&mut io::stderr(), "Failed to initialize logging: {}", e);
        exit(exitcode::SOFTWARE)
    });
    if cfg!(debug_assertions) {
        warn!("Debug mode! The program will likely be much slower.");
    }
    for (i, arg) in env::args().enumerate() {
        trace!("argv[{}] = {:?}", i, arg);
    }
    trace!("Options parsed from argv:\n{:#?}", opts);

    // The pipeline (and especially its HTTP client for caption generation)
    // has to be created outside of the async runtime.
    let captioner = match create_captioner(&opts) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            error!("Failed to start the captioning pipeline: {}", e);
            exit(exitcode::CONFIG)
        },
    };
    for &what in &opts.preload {
        captioner.preload(what);
    }

    let service = Quip::new(captioner.clone(),
        FileStorage::new(opts.output_dir(), opts.public_url.as_str()));
    if let Err(e) = start_server(&opts, service) {
        error!("Server error: {}", e);
        exit(exitcode::UNAVAILABLE)
    }
    info!("Server stopped");
}

/// Print an error that may occur while parsing arguments.
fn print_args_error(e: ArgsError) {
    match e {
        // In case of generic parse error (incl. --help and --version),
        // clap knows best how to report it.
        ArgsError::Parse(e) => e.exit(),
        e => {
            let _ = writeln!(&mut io::stderr(), "Failed to parse arguments: {}", e);
        },
    }
}


/// Create the captioner with the whole pipeline, as configured by the options.
fn create_captioner(opts: &Options) -> Result<Captioner, Box<dyn Error>> {
    let catalog = Catalog::from_path(opts.catalog_path())?;
    info!("Loaded {} meme template(s) from {}", catalog.len(), opts.catalog_path().display());

    let mut builder = EngineBuilder::<TemplateLoader, FontLoader>::new()
        .template_directory(opts.template_dir())
        .font_directory(opts.font_dir());
    if let Some(quality) = opts.jpeg_quality {
        builder = builder.jpeg_quality(quality);
    }
    if let Some(size) = opts.template_cache_size {
        builder = builder.template_cache_size(size);
    }
    if let Some(size) = opts.font_cache_size {
        builder = builder.font_cache_size(size);
    }
    let engine = builder.build()?;

    let storage = FileStorage::new(opts.output_dir(), opts.public_url.as_str());
    let mut pipeline = Pipeline::new(catalog, engine, storage);
    match OpenAiGenerator::from_env(opts.generation_timeout) {
        Ok(generator) => {
            info!("Captions will be generated by {} at {}", opts.model, opts.api_url);
            pipeline = pipeline.with_generator(
                generator.base_url(opts.api_url.as_str()).model(opts.model.as_str()));
        },
        Err(e) => warn!("Captions can't be generated from prompts: {}", e),
    }

    let captioner = Captioner::new(pipeline, opts.render_threads)?
        .with_task_timeout(opts.request_timeout);
    Ok(captioner)
}


/// Run the HTTP server until it's interrupted with Ctrl+C.
fn start_server(opts: &Options, service: Quip) -> Result<(), Box<dyn Error>> {
    let runtime = runtime::Builder::new_multi_thread()
        .thread_name("quipd-io")
        .enable_all()
        .build()?;
    runtime.block_on(serve(opts.address, opts.shutdown_timeout, service))
}

async fn serve(addr: SocketAddr, shutdown_timeout: Duration,
               service: Quip) -> Result<(), Box<dyn Error>> {
    let make_service = make_service_fn(move |conn: &AddrStream| {
        let service = service.clone();
        let remote = conn.remote_addr();
        async move {
            Ok::<_, hyper::Error>(service_fn(move |req| service.clone().call(remote, req)))
        }
    });

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let server = Server::try_bind(&addr)?
        .serve(make_service)
        .with_graceful_shutdown(shutdown_rx.map(|_| ()));
    info!("Starting the server to listen on {}...", addr);
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => return result.map_err(Into::into),
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupt signal received, shutting down...");
            let _ = shutdown_tx.send(());
        },
    }

    // Give the pending connections some time to finish.
    if shutdown_timeout.as_secs() > 0 {
        debug!("Waiting up to {} secs for pending connections to finish...",
            shutdown_timeout.as_secs());
        match tokio::time::timeout(shutdown_timeout, server).await {
            Ok(result) => result?,
            Err(_) => warn!("Pending connections didn't finish in time"),
        }
    }
    Ok(())
}
