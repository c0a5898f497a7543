//! Module for handling command line arguments.

use std::borrow::Cow;
use std::collections::HashSet;
use std::env;
use std::ffi::OsString;
use std::fmt;
use std::net::{AddrParseError, SocketAddr};
use std::num::ParseIntError;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use clap::{self, builder::PossibleValuesParser, Arg, ArgAction, ArgMatches, Command};
use quip::{DEFAULT_GENERATION_MODEL, DEFAULT_GENERATION_URL};
use thiserror::Error;

use super::{NAME, VERSION};


/// Parse command line arguments and return `Options` object.
#[inline]
pub fn parse() -> Result<Options, ArgsError> {
    parse_from_argv(env::args_os())
}

/// Parse application options from given array of arguments
/// (*all* arguments, including binary name).
#[inline]
pub fn parse_from_argv<I, T>(argv: I) -> Result<Options, ArgsError>
    where I: IntoIterator<Item=T>, T: Clone + Into<OsString>
{
    let parser = create_parser();
    let matches = parser.try_get_matches_from(argv)?;
    Options::try_from(matches)
}


/// Structure to hold options received from the command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Options {
    /// Verbosity of the logging output.
    ///
    /// Corresponds to the number of times the -v flag has been passed.
    /// If -q has been used instead, this will be negative.
    pub verbosity: isize,

    /// Address where the server should listen on.
    pub address: SocketAddr,

    /// Directory with the template catalog, template images and fonts.
    pub data_dir: PathBuf,
    /// Directory where the rendered images are stored.
    /// If omitted, it's the `generated` subdirectory of `data_dir`.
    pub output_dir: Option<PathBuf>,
    /// URL prefix under which the rendered images are exposed.
    pub public_url: String,

    /// Number of threads to use for image captioning.
    /// If omitted, the actual count will be based on the number of CPUs.
    pub render_threads: Option<usize>,
    /// Quality of JPEG images produced.
    pub jpeg_quality: Option<u8>,

    /// Size of the template cache.
    pub template_cache_size: Option<usize>,
    /// Size of the font cache.
    pub font_cache_size: Option<usize>,
    /// Which kinds of resources to preload.
    pub preload: HashSet<Resource>,

    /// Chat model used for caption generation.
    pub model: String,
    /// Base URL of the caption generation API.
    pub api_url: String,
    /// Maximum time allowed for a single call to the caption generation API.
    pub generation_timeout: Duration,

    // Maximum time allowed for a single caption request.
    pub request_timeout: Duration,
    // Maximum time the server will wait for pending connections to terminate.
    pub shutdown_timeout: Duration,
}

#[allow(dead_code)]
impl Options {
    #[inline]
    pub fn verbose(&self) -> bool { self.verbosity > 0 }
    #[inline]
    pub fn quiet(&self) -> bool { self.verbosity < 0 }
}

impl Options {
    #[inline]
    pub fn catalog_path(&self) -> PathBuf {
        self.data_dir.join(CATALOG_FILE)
    }

    #[inline]
    pub fn template_dir(&self) -> PathBuf {
        self.data_dir.join("templates")
    }

    #[inline]
    pub fn font_dir(&self) -> PathBuf {
        self.data_dir.join("fonts")
    }

    pub fn output_dir(&self) -> Cow<Path> {
        match self.output_dir {
            Some(ref dir) => Cow::Borrowed(dir.as_path()),
            None => Cow::Owned(self.data_dir.join("generated")),
        }
    }
}

impl TryFrom<ArgMatches> for Options {
    type Error = ArgsError;

    fn try_from(matches: ArgMatches) -> Result<Self, Self::Error> {
        let verbose_count = matches.get_count(OPT_VERBOSE) as isize;
        let quiet_count = matches.get_count(OPT_QUIET) as isize;
        let verbosity = verbose_count - quiet_count;

        let address = parse_address(value_of(&matches, ARG_ADDR).unwrap_or(DEFAULT_ADDRESS))?;

        let data_dir = PathBuf::from(value_of(&matches, OPT_DATA_DIR).unwrap_or(DEFAULT_DATA_DIR));
        let output_dir = value_of(&matches, OPT_OUTPUT_DIR).map(PathBuf::from);
        let public_url = value_of(&matches, OPT_PUBLIC_URL)
            .unwrap_or(DEFAULT_PUBLIC_URL).to_owned();

        let render_threads = match value_of(&matches, OPT_RENDER_THREADS) {
            Some(rt) => Some(rt.parse::<usize>().map_err(ArgsError::RenderThreads)?),
            None => None,
        };
        let jpeg_quality = match value_of(&matches, OPT_JPEG_QUALITY) {
            Some(q) => Some(parse_quality(q).map_err(ArgsError::JpegQuality)?),
            None => None,
        };

        let template_cache_size = match value_of(&matches, OPT_TEMPLATE_CACHE_SIZE) {
            Some(tcs) => Some(tcs.parse::<usize>().map_err(ArgsError::TemplateCache)?),
            None => None,
        };
        let font_cache_size = match value_of(&matches, OPT_FONT_CACHE_SIZE) {
            Some(fcs) => Some(fcs.parse::<usize>().map_err(ArgsError::FontCache)?),
            None => None,
        };
        let preload = {
            let values: Vec<&str> = matches.get_many::<String>(OPT_PRELOAD)
                .map(|vs| vs.map(String::as_str).collect()).unwrap_or_default();
            parse_preload(&values)?
        };

        let model = value_of(&matches, OPT_MODEL)
            .unwrap_or(DEFAULT_GENERATION_MODEL).to_owned();
        let api_url = value_of(&matches, OPT_API_URL)
            .unwrap_or(DEFAULT_GENERATION_URL).to_owned();
        let generation_timeout = parse_secs(&matches, OPT_GENERATION_TIMEOUT)
            .map_err(ArgsError::GenerationTimeout)?;

        let request_timeout = parse_secs(&matches, OPT_REQUEST_TIMEOUT)
            .map_err(ArgsError::RequestTimeout)?;
        let shutdown_timeout = parse_secs(&matches, OPT_SHUTDOWN_TIMEOUT)
            .map_err(ArgsError::ShutdownTimeout)?;

        Ok(Options{
            verbosity, address,
            data_dir, output_dir, public_url,
            render_threads, jpeg_quality,
            template_cache_size, font_cache_size, preload,
            model, api_url, generation_timeout,
            request_timeout, shutdown_timeout,
        })
    }
}

/// Parse the server address, filling in the default host or port if either is missing.
fn parse_address(s: &str) -> Result<SocketAddr, AddrParseError> {
    let s = s.trim();
    if let Some(port) = s.strip_prefix(':') {
        if !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()) {
            return format!("{}:{}", DEFAULT_HOST, port).parse();
        }
    }
    let is_bare_ipv4 = s.contains('.') && !s.contains(':');
    let is_bare_ipv6 = s.starts_with('[') && s.ends_with(']');
    if is_bare_ipv4 || is_bare_ipv6 {
        return format!("{}:{}", s, DEFAULT_PORT).parse();
    }
    s.parse()
}

/// Resolve the --preload values into a set of resources.
/// `all` (or `both`) and `none` must be the only values if present.
fn parse_preload(values: &[&str]) -> Result<HashSet<Resource>, PreloadError> {
    let all = values.iter().filter(|v| matches!(**v, "all" | "both")).count();
    let none = values.iter().filter(|v| **v == "none").count();
    match (all, none) {
        (0, 0) => values.iter().map(|v| v.parse()).collect(),
        (_, 0) if all == values.len() => Ok(Resource::all().into_iter().collect()),
        (0, _) if none == values.len() => Ok(HashSet::new()),
        (a, n) if a > 0 && n > 0 => Err(PreloadError::Conflict(
            "cannot specify `--preload all` and `--preload none` simultaneously")),
        _ => Err(PreloadError::Conflict(
            "cannot specify `--preload all` or `none` alongside specific resource types")),
    }
}

#[inline]
fn value_of<'m>(matches: &'m ArgMatches, name: &str) -> Option<&'m str> {
    matches.get_one::<String>(name).map(String::as_str)
}

/// Parse a string into an image quality percentage.
fn parse_quality(s: &str) -> Result<u8, QualityError> {
    match s.trim().parse()? {
        q if q == 0 || q > 100 => Err(QualityError::Range(q)),
        q => Ok(q),
    }
}

/// Parse the value of a flag given in seconds.
fn parse_secs(matches: &ArgMatches, name: &str) -> Result<Duration, ParseIntError> {
    let secs = value_of(matches, name).unwrap_or("0").trim().parse::<u64>()?;
    Ok(Duration::from_secs(secs))
}


/// Error that can occur while parsing of command line arguments.
#[derive(Debug, Error)]
pub enum ArgsError {
    /// General when parsing the arguments.
    #[error("{0}")]
    Parse(#[from] clap::Error),
    /// Error while parsing the server address.
    #[error("invalid server address: {0}")]
    Address(#[from] AddrParseError),
    /// Error while parsing --render-threads flag.
    #[error("invalid --render-threads value: {0}")]
    RenderThreads(#[source] ParseIntError),
    /// Error while parsing --jpeg-quality flag.
    #[error("invalid --jpeg-quality value: {0}")]
    JpegQuality(#[source] QualityError),
    /// Error while parsing --template-cache flag.
    #[error("invalid --template-cache value: {0}")]
    TemplateCache(#[source] ParseIntError),
    /// Error while parsing --font-cache flag.
    #[error("invalid --font-cache value: {0}")]
    FontCache(#[source] ParseIntError),
    /// Error while parsing --preload flag.
    #[error("invalid --preload value: {0}")]
    Preload(#[from] PreloadError),
    /// Error while parsing --generation-timeout flag.
    #[error("invalid --generation-timeout value: {0}")]
    GenerationTimeout(#[source] ParseIntError),
    /// Error while parsing --request-timeout flag.
    #[error("invalid --request-timeout value: {0}")]
    RequestTimeout(#[source] ParseIntError),
    /// Error while parsing --shutdown-timeout flag.
    #[error("invalid --shutdown-timeout value: {0}")]
    ShutdownTimeout(#[source] ParseIntError),
}

/// Error that can occur while parsing the --preload flag.
#[derive(Debug, Error)]
pub enum PreloadError {
    /// "all" or "none" is used alongside other options.
    #[error("{0}")]
    Conflict(&'static str),
    /// Unknown resource type.
    #[error("unknown resource type `{0}`")]
    InvalidResource(String),
}

/// Error that can occur while parsing an --X-quality flag.
#[derive(Debug, Error)]
pub enum QualityError {
    /// Error while parsing the value as number.
    #[error("{0}")]
    Parse(#[from] ParseIntError),
    /// Error for when the quality value is out of range.
    #[error("quality must be between 1 and 100, got {0}")]
    Range(u8),
}


/// One of the resources used for rendering captions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Resource { Template, Font }

impl Resource {
    #[inline]
    pub fn all() -> [Resource; 2] {
        [Resource::Template, Resource::Font]
    }
}

impl FromStr for Resource {
    type Err = PreloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().trim_end_matches('s');  // accept singular/plural
        for r in Resource::all() {
            if r.to_string().trim_end_matches('s') == s {
                return Ok(r);
            }
        }
        Err(PreloadError::InvalidResource(s.to_owned()))
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}", format!("{:?}s", self).to_lowercase())
    }
}


// Parser configuration

const ABOUT: &'static str = "Captions on demand, over HTTP";

const ARG_ADDR: &'static str = "address";
const OPT_DATA_DIR: &'static str = "data-dir";
const OPT_OUTPUT_DIR: &'static str = "output-dir";
const OPT_PUBLIC_URL: &'static str = "public-url";
const OPT_RENDER_THREADS: &'static str = "render-threads";
const OPT_JPEG_QUALITY: &'static str = "jpeg-quality";
const OPT_TEMPLATE_CACHE_SIZE: &'static str = "template-cache";
const OPT_FONT_CACHE_SIZE: &'static str = "font-cache";
const OPT_PRELOAD: &'static str = "preload";
const OPT_MODEL: &'static str = "model";
const OPT_API_URL: &'static str = "api-url";
const OPT_GENERATION_TIMEOUT: &'static str = "generation-timeout";
const OPT_REQUEST_TIMEOUT: &'static str = "request-timeout";
const OPT_SHUTDOWN_TIMEOUT: &'static str = "shutdown-timeout";
const OPT_VERBOSE: &'static str = "verbose";
const OPT_QUIET: &'static str = "quiet";

const VALID_PRELOAD: &'static [&'static str] = &["all", "both", "none",
                                                 "templates", "fonts"];

const CATALOG_FILE: &'static str = "catalog.json";

const DEFAULT_HOST: &'static str = "0.0.0.0";
const DEFAULT_PORT: u16 = 1337;
const DEFAULT_ADDRESS: &'static str = "0.0.0.0:1337";
const DEFAULT_DATA_DIR: &'static str = "data";
const DEFAULT_PUBLIC_URL: &'static str = "/generated";
const DEFAULT_GENERATION_TIMEOUT: &'static str = "60";
const DEFAULT_REQUEST_TIMEOUT: &'static str = "90";
const DEFAULT_SHUTDOWN_TIMEOUT: &'static str = "30";


/// Create the parser for application's command line.
fn create_parser() -> Command {
    let mut parser = Command::new(*NAME);
    if let Some(version) = *VERSION {
        parser = parser.version(version);
    }
    parser
        .about(ABOUT)
        .dont_collapse_args_in_usage(true)
        .color(clap::ColorChoice::Never)

        .arg(Arg::new(ARG_ADDR)
            .value_name("ADDRESS:PORT")
            .required(false)
            .default_value(DEFAULT_ADDRESS)
            .help("Binds the server to given address")
            .long_help(concat!(
                "The address and/or port for the server to listen on.\n\n",
                "This argument can be an IP address of a network interface, ",
                "optionally followed by colon and a port number. ",
                "Alternatively, a colon and port alone is also allowed, ",
                "in which case the server will listen on all network interfaces.")))

        // Data options.
        .arg(Arg::new(OPT_DATA_DIR)
            .long("data-dir")
            .value_name("DIR")
            .env("QUIP_DATA_DIR")
            .default_value(DEFAULT_DATA_DIR)
            .help("Directory with the template catalog, images and fonts")
            .long_help(concat!(
                "Directory with the data used for rendering.\n\n",
                "It should contain the catalog.json file, ",
                "as well as the templates/ and fonts/ subdirectories.")))
        .arg(Arg::new(OPT_OUTPUT_DIR)
            .long("output-dir")
            .value_name("DIR")
            .env("QUIP_OUTPUT_DIR")
            .help("Directory where rendered images are stored")
            .long_help(concat!(
                "Directory where the rendered images are stored.\n\n",
                "If omitted, the generated/ subdirectory of --data-dir is used.")))
        .arg(Arg::new(OPT_PUBLIC_URL)
            .long("public-url")
            .value_name("URL")
            .default_value(DEFAULT_PUBLIC_URL)
            .help("URL prefix of the rendered images in responses"))

        // Rendering options.
        .arg(Arg::new(OPT_RENDER_THREADS)
            .long("render-threads")
            .value_name("N")
            .required(false)
            .help("Number of render threads to use")
            .long_help(concat!(
                "Number of threads used for image captioning.\n\n",
                "If omitted, one thread per each CPU core will be used.")))
        .arg(Arg::new(OPT_JPEG_QUALITY)
            .long("jpeg-quality")
            .value_name("PERCENT")
            .required(false)
            .help("Quality of JPEG images rendered"))

        // Cache options.
        .arg(Arg::new(OPT_TEMPLATE_CACHE_SIZE)
            .long("template-cache")
            .value_name("SIZE")
            .required(false)
            .help("Size of the template cache"))
        .arg(Arg::new(OPT_FONT_CACHE_SIZE)
            .long("font-cache")
            .value_name("SIZE")
            .required(false)
            .help("Size of the font cache"))
        .arg(Arg::new(OPT_PRELOAD)
            .long("preload")
            .value_name("WHAT")
            .required(false)
            .value_parser(PossibleValuesParser::new(VALID_PRELOAD.iter().copied()))
            .action(ArgAction::Append)
            .help("What resources to preload on server startup")
            .long_help(concat!(
                "Which resource caches should be filled when the server starts\n\n",
                "Templates are loaded in the catalog order, ",
                "up to the relevant cache's capacity. ",
                "Fonts are the ones used by the font size ladder.")))

        // Caption generation options.
        .arg(Arg::new(OPT_MODEL)
            .long("model")
            .value_name("NAME")
            .env("QUIP_MODEL")
            .help("Chat model used to generate captions from prompts"))
        .arg(Arg::new(OPT_API_URL)
            .long("api-url")
            .value_name("URL")
            .env("QUIP_API_URL")
            .help("Base URL of an OpenAI-compatible API")
            .long_help(concat!(
                "Base URL of the chat completions API used to generate captions.\n\n",
                "The API key is always read from the OPENAI_API_KEY environment variable. ",
                "Without it, only requests with ready captions can be served.")))
        .arg(Arg::new(OPT_GENERATION_TIMEOUT)
            .long("generation-timeout")
            .value_name("SECS")
            .default_value(DEFAULT_GENERATION_TIMEOUT)
            .help("Maximum time allowed for a single caption generation (secs)"))

        // Timeout flags.
        .arg(Arg::new(OPT_REQUEST_TIMEOUT)
            .long("request-timeout")
            .value_name("SECS")
            .required(false)
            .default_value(
                // Disable request timeouts in debug mode unless specifically requested.
                if cfg!(debug_assertions) { "0" } else { DEFAULT_REQUEST_TIMEOUT })
            .help("Maximum time allowed for a single request (secs)"))
        .arg(Arg::new(OPT_SHUTDOWN_TIMEOUT)
            .long("shutdown-timeout")
            .value_name("SECS")
            .required(false)
            .default_value(
                // Disable waiting for server to shut down in debug mode by default.
                if cfg!(debug_assertions) { "0" } else { DEFAULT_SHUTDOWN_TIMEOUT })
            .help("Time to wait for remaining connections during shutdown (secs)"))

        // Verbosity flags.
        .arg(Arg::new(OPT_VERBOSE)
            .long("verbose").short('v')
            .action(ArgAction::Count)
            .conflicts_with(OPT_QUIET)
            .help("Increase logging verbosity"))
        .arg(Arg::new(OPT_QUIET)
            .long("quiet").short('q')
            .action(ArgAction::Count)
            .conflicts_with(OPT_VERBOSE)
            .help("Decrease logging verbosity"))
}
