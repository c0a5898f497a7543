//! Module defining the command line argument parser.

use std::path::PathBuf;
use std::time::Duration;

use clap::{self, Arg, ArgAction, ArgMatches, Command};
use quip::{DEFAULT_DEBOUNCE_MS, DEFAULT_GENERATION_MODEL, DEFAULT_GENERATION_URL};

use crate::{NAME, VERSION};
use super::caption::caption_text;
use super::model::{ArgsError, Mode, Options, QualityError};


impl TryFrom<ArgMatches> for Options {
    type Error = ArgsError;

    fn try_from(matches: ArgMatches) -> Result<Self, Self::Error> {
        let verbose_count = matches.get_count(OPT_VERBOSE) as isize;
        let quiet_count = matches.get_count(OPT_QUIET) as isize;
        let verbosity = verbose_count - quiet_count;

        let mode = if matches.get_flag(OPT_LIST) {
            Mode::List
        } else if matches.get_flag(OPT_EDIT) {
            Mode::Edit
        } else {
            Mode::Render
        };
        let template_id = value_of(&matches, ARG_TEMPLATE).map(|t| t.trim().to_owned());
        let caption = value_of(&matches, ARG_CAPTION).map(caption_text);
        let prompt = value_of(&matches, OPT_PROMPT).map(|p| p.trim().to_owned());
        if mode == Mode::Render && caption.is_none() && prompt.is_none() {
            return Err(ArgsError::NoCaption);
        }

        let debounce = match value_of(&matches, OPT_DEBOUNCE) {
            Some(ms) => Duration::from_millis(ms.trim().parse()
                .map_err(|e| ArgsError::Duration(ms.to_owned(), e))?),
            None => Duration::from_millis(DEFAULT_DEBOUNCE_MS),
        };
        let json = matches.get_flag(OPT_JSON);

        let data_dir = PathBuf::from(value_of(&matches, OPT_DATA_DIR).unwrap_or(DEFAULT_DATA_DIR));
        let output_dir = value_of(&matches, OPT_OUTPUT_DIR).map(PathBuf::from);
        let jpeg_quality = match value_of(&matches, OPT_JPEG_QUALITY) {
            Some(q) => Some(parse_quality(q)?),
            None => None,
        };

        let model = value_of(&matches, OPT_MODEL)
            .unwrap_or(DEFAULT_GENERATION_MODEL).to_owned();
        let api_url = value_of(&matches, OPT_API_URL)
            .unwrap_or(DEFAULT_GENERATION_URL).to_owned();
        let generation_timeout = {
            let secs = value_of(&matches, OPT_GENERATION_TIMEOUT)
                .unwrap_or(DEFAULT_GENERATION_TIMEOUT);
            Duration::from_secs(secs.trim().parse()
                .map_err(|e| ArgsError::Duration(secs.to_owned(), e))?)
        };

        Ok(Options{
            verbosity,
            mode, template_id, caption, prompt, debounce, json,
            data_dir, output_dir, jpeg_quality,
            model, api_url, generation_timeout,
        })
    }
}

#[inline]
fn value_of<'m>(matches: &'m ArgMatches, name: &str) -> Option<&'m str> {
    matches.get_one::<String>(name).map(String::as_str)
}

fn parse_quality(s: &str) -> Result<u8, QualityError> {
    match s.trim().parse()? {
        q if q == 0 || q > 100 => Err(QualityError::Range(q)),
        q => Ok(q),
    }
}


// Parser definition

const ABOUT: &'static str = "Captions in the shell";

const ARG_TEMPLATE: &'static str = "template";
const ARG_CAPTION: &'static str = "caption";
const OPT_PROMPT: &'static str = "prompt";
const OPT_EDIT: &'static str = "edit";
const OPT_DEBOUNCE: &'static str = "debounce";
const OPT_LIST: &'static str = "list";
const OPT_JSON: &'static str = "json";
const OPT_DATA_DIR: &'static str = "data-dir";
const OPT_OUTPUT_DIR: &'static str = "output-dir";
const OPT_JPEG_QUALITY: &'static str = "jpeg-quality";
const OPT_MODEL: &'static str = "model";
const OPT_API_URL: &'static str = "api-url";
const OPT_GENERATION_TIMEOUT: &'static str = "generation-timeout";
const OPT_VERBOSE: &'static str = "verbose";
const OPT_QUIET: &'static str = "quiet";

const DEFAULT_DATA_DIR: &'static str = "data";
const DEFAULT_GENERATION_TIMEOUT: &'static str = "60";


/// Create the parser for application's command line.
pub fn create_parser() -> Command {
    let mut parser = Command::new(*NAME);
    if let Some(version) = *VERSION {
        parser = parser.version(version);
    }
    parser
        .about(ABOUT)
        .dont_collapse_args_in_usage(true)
        .color(clap::ColorChoice::Never)

        // What to caption.
        .arg(Arg::new(ARG_TEMPLATE)
            .value_name("TEMPLATE_ID")
            .required_unless_present(OPT_LIST)
            .help("ID of the meme template to caption"))
        .arg(Arg::new(ARG_CAPTION)
            .value_name("CAPTION")
            .required(false)
            .help("Caption to render verbatim")
            .long_help(concat!(
                "The caption to put on the meme template.\n\n",
                "Lines are separated with the | character (or a literal \\n). ",
                "For two-line captions on top/bottom templates, ",
                "the first line goes to the top and the second one to the bottom.")))
        .arg(Arg::new(OPT_PROMPT)
            .long("prompt").short('p')
            .value_name("TEXT")
            .conflicts_with(ARG_CAPTION)
            .help("Generate the caption from given prompt")
            .long_help(concat!(
                "Have a chat model write the caption, based on given prompt.\n\n",
                "This requires the OPENAI_API_KEY environment variable to be set.")))
        .arg(Arg::new(OPT_EDIT)
            .long("edit").short('e')
            .action(ArgAction::SetTrue)
            .conflicts_with_all([ARG_CAPTION, OPT_PROMPT])
            .help("Read caption edits from standard input")
            .long_help(concat!(
                "Read captions from standard input, one per line, ",
                "and re-render the meme once the typing settles down.\n\n",
                "Only the last caption entered within the --debounce window gets rendered. ",
                "The pending caption is rendered right away at the end of input.")))
        .arg(Arg::new(OPT_DEBOUNCE)
            .long("debounce")
            .value_name("MILLIS")
            .requires(OPT_EDIT)
            .help("Quiet window before rendering an edited caption (millisecs)"))
        .arg(Arg::new(OPT_LIST)
            .long("list").short('l')
            .action(ArgAction::SetTrue)
            .conflicts_with_all([ARG_TEMPLATE, ARG_CAPTION, OPT_PROMPT, OPT_EDIT])
            .help("List the available meme templates"))
        .arg(Arg::new(OPT_JSON)
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print the results as JSON"))

        // Data options.
        .arg(Arg::new(OPT_DATA_DIR)
            .long("data-dir")
            .value_name("DIR")
            .env("QUIP_DATA_DIR")
            .default_value(DEFAULT_DATA_DIR)
            .help("Directory with the template catalog, images and fonts"))
        .arg(Arg::new(OPT_OUTPUT_DIR)
            .long("output-dir").short('o')
            .value_name("DIR")
            .env("QUIP_OUTPUT_DIR")
            .help("Directory to write the rendered images to")
            .long_help(concat!(
                "Directory where the rendered images are written.\n\n",
                "If omitted, the generated/ subdirectory of --data-dir is used.")))
        .arg(Arg::new(OPT_JPEG_QUALITY)
            .long("jpeg-quality")
            .value_name("PERCENT")
            .help("Quality of JPEG images rendered"))

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
            .help("Base URL of an OpenAI-compatible API"))
        .arg(Arg::new(OPT_GENERATION_TIMEOUT)
            .long("generation-timeout")
            .value_name("SECS")
            .default_value(DEFAULT_GENERATION_TIMEOUT)
            .help("Maximum time allowed for a single caption generation (secs)"))

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
