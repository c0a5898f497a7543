//!
//! quipsh -- Captions in the shell
//!

             extern crate clap;
             extern crate exitcode;
#[macro_use] extern crate lazy_static;
             extern crate quip;
             extern crate serde_json;
             extern crate slog;
             extern crate slog_envlogger;
             extern crate slog_scope;
             extern crate slog_stdlog;
             extern crate slog_term;
             extern crate thiserror;

// `log` must be at the end of these declarations because we want to use
// the standard `log` macros, which would otherwise be shadowed by `slog`.
#[macro_use] extern crate log;

#[cfg(test)] #[macro_use] extern crate spectral;


mod args;
mod logging;


use std::env;
use std::error::Error;
use std::io::{self, BufRead, Write};
use std::process::exit;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use quip::{Catalog, Debouncer, EngineBuilder, ErrorKind, FileStorage, FontLoader,
           OpenAiGenerator, Pipeline, PipelineError, RenderRequest, RenderResponse,
           TemplateLoader};

use crate::args::{caption_text, ArgsError, Mode, Options};


lazy_static! {
    /// Application / package name, as filled out by Cargo.
    static ref NAME: &'static str = option_env!("CARGO_PKG_NAME").unwrap_or("quipsh");

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
        debug!("argv[{}] = {:?}", i, arg);
    }
    trace!("Options parsed from argv:\n{:#?}", opts);

    let catalog = Catalog::from_path(opts.catalog_path()).unwrap_or_else(|e| {
        error!("Failed to load the meme templates from {}: {}",
            opts.catalog_path().display(), e);
        exit(exitcode::CONFIG)
    });
    debug!("Loaded {} meme template(s)", catalog.len());

    if opts.mode == Mode::List {
        print_catalog(&catalog, opts.json).unwrap_or_else(|e| {
            error!("Failed to list the meme templates: {}", e);
            exit(exitcode::IOERR)
        });
        return;
    }

    let template_id = opts.template_id.clone().unwrap_or_default();
    if !catalog.contains(&template_id) {
        error!("Unknown meme template `{}` (see --list for available ones)", template_id);
        exit(exitcode::DATAERR);
    }
    let pipeline = create_pipeline(&opts, catalog).unwrap_or_else(|e| {
        error!("Failed to set up the captioning pipeline: {}", e);
        exit(exitcode::CONFIG)
    });

    let code = match opts.mode {
        Mode::Edit => edit(pipeline, &template_id, opts.debounce, opts.json)
            .unwrap_or_else(|e| {
                error!("Error while reading captions: {}", e);
                exitcode::IOERR
            }),
        _ => {
            let request = match opts.prompt {
                Some(ref prompt) => RenderRequest::with_prompt(template_id.as_str(), prompt.as_str()),
                None => RenderRequest::with_caption(
                    template_id.as_str(), opts.caption.clone().unwrap_or_default()),
            };
            render(&pipeline, &request, opts.json)
        },
    };
    exit(code)
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


/// Create the captioning pipeline, as configured by the options.
fn create_pipeline(opts: &Options, catalog: Catalog) -> Result<Pipeline, Box<dyn Error>> {
    let mut builder = EngineBuilder::<TemplateLoader, FontLoader>::new()
        .template_directory(opts.template_dir())
        .font_directory(opts.font_dir());
    if let Some(quality) = opts.jpeg_quality {
        builder = builder.jpeg_quality(quality);
    }
    let engine = builder.build()?;

    // Images are referred to by their paths.
    let output_dir = opts.output_dir();
    let storage = FileStorage::new(&output_dir, output_dir.display().to_string());

    let mut pipeline = Pipeline::new(catalog, engine, storage);
    if opts.prompt.is_some() {
        let generator = OpenAiGenerator::from_env(opts.generation_timeout)?
            .base_url(opts.api_url.as_str())
            .model(opts.model.as_str());
        debug!("Captions will be generated by {} at {}", opts.model, opts.api_url);
        pipeline = pipeline.with_generator(generator);
    }
    Ok(pipeline)
}


/// Render a single meme and print the result.
/// Returns the program's exit code.
fn render(pipeline: &Pipeline, request: &RenderRequest, json: bool) -> exitcode::ExitCode {
    trace!("Rendering {:?}", request);
    match pipeline.render(request) {
        Ok(response) => {
            info!("Rendered meme {}", response.image_url);
            if let Err(e) = print_response(&response, json) {
                error!("Failed to print the result: {}", e);
                return exitcode::IOERR;
            }
            exitcode::OK
        },
        Err(e) => {
            error!("Error while rendering the meme: {}", e);
            exit_code_for(&e)
        },
    }
}

/// Render the meme again after every edit of the caption read from standard input,
/// once the edits settle down.
/// Returns the program's exit code.
fn edit(pipeline: Pipeline, template_id: &str,
        window: Duration, json: bool) -> io::Result<exitcode::ExitCode> {
    let failures = Arc::new(AtomicUsize::new(0));
    let debouncer = Debouncer::with_window(window, {
        let template_id = template_id.to_owned();
        let failures = failures.clone();
        move |caption: String| {
            let request = RenderRequest::with_caption(template_id.as_str(), caption);
            if render(&pipeline, &request, json) != exitcode::OK {
                failures.fetch_add(1, Ordering::SeqCst);
            }
        }
    })?;
    info!("Reading captions for `{}` from standard input, one per line...", template_id);

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        trace!("Caption edit: {:?}", line);
        debouncer.submit(caption_text(&line));
    }
    debug!("End of input, rendering the pending caption (if any)");
    debouncer.flush();

    let failures = failures.load(Ordering::SeqCst);
    if failures > 0 {
        warn!("{} caption(s) failed to render", failures);
        return Ok(exitcode::SOFTWARE);
    }
    Ok(exitcode::OK)
}


/// Print the result of rendering a meme.
fn print_response(response: &RenderResponse, json: bool) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if json {
        serde_json::to_writer(&mut out, response)?;
        writeln!(out)?;
    } else {
        for line in response.caption.lines() {
            writeln!(out, "> {}", line)?;
        }
        writeln!(out, "{}", response.image_url)?;
    }
    out.flush()
}

/// Print the meme templates from the catalog.
fn print_catalog(catalog: &Catalog, json: bool) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if json {
        let templates: Vec<_> = catalog.iter().collect();
        serde_json::to_writer_pretty(&mut out, &templates)?;
        writeln!(out)?;
    } else {
        for template in catalog.iter() {
            writeln!(out, "{}\t{}", template.id, template.name)?;
        }
    }
    out.flush()
}


/// Determine the exit code that best corresponds to a meme rendering error.
fn exit_code_for(e: &PipelineError) -> exitcode::ExitCode {
    match e.kind() {
        ErrorKind::InvalidRequest => exitcode::USAGE,
        ErrorKind::TemplateNotFound => exitcode::DATAERR,
        ErrorKind::CaptionGenerationFailed => exitcode::UNAVAILABLE,
        ErrorKind::FontUnavailable | ErrorKind::TemplateAssetMissing => exitcode::NOINPUT,
        ErrorKind::RenderFailed => exitcode::SOFTWARE,
        ErrorKind::PersistFailed => exitcode::CANTCREAT,
    }
}


#[cfg(test)]
mod tests {
    use std::io;
    use quip::{GenerateError, PipelineError, RequestError};
    use super::exit_code_for;

    #[test]
    fn exit_codes() {
        assert_eq!(exitcode::DATAERR, exit_code_for(&PipelineError::TemplateNotFound("x".into())));
        assert_eq!(exitcode::USAGE, exit_code_for(&RequestError::NoCaptionSource.into()));
        assert_eq!(exitcode::UNAVAILABLE, exit_code_for(
            &PipelineError::CaptionGeneration(GenerateError::EmptyContent)));
        assert_eq!(exitcode::CANTCREAT, exit_code_for(&PipelineError::Persist(
            io::Error::new(io::ErrorKind::Other, "disk full"))));
    }
}
