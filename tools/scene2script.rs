/// scene2script — generate a WebGAL script from a scene script file.
///
/// Usage: scene2script <script.json|script.yaml> [--settings <file.ron>]
///                     [--figures <figures.json> | --game <dir>] [--seed <n>]
///                     [--out <file>] [--overwrite] [--crlf] [--lenient-document]

use scene_script::config::LineEnding;
use scene_script::core::generator::ScriptGenerator;
use scene_script::project::{FsProject, GameProject};
use scene_script::schema::figure::CharacterKnowledgeBase;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

struct Options {
    script: String,
    settings: Option<String>,
    figures: Option<String>,
    game: Option<String>,
    seed: Option<u64>,
    out: Option<PathBuf>,
    overwrite: bool,
    crlf: bool,
    lenient_document: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        process::exit(0);
    }

    let options = parse_args(&args);
    if let Err(e) = run(&options) {
        eprintln!("ERROR: {}", e);
        process::exit(1);
    }
}

fn parse_args(args: &[String]) -> Options {
    let mut options = Options {
        script: args[1].clone(),
        settings: None,
        figures: None,
        game: None,
        seed: None,
        out: None,
        overwrite: false,
        crlf: false,
        lenient_document: false,
    };

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--settings" if i + 1 < args.len() => {
                i += 1;
                options.settings = Some(args[i].clone());
            }
            "--figures" if i + 1 < args.len() => {
                i += 1;
                options.figures = Some(args[i].clone());
            }
            "--game" if i + 1 < args.len() => {
                i += 1;
                options.game = Some(args[i].clone());
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                match args[i].parse() {
                    Ok(seed) => options.seed = Some(seed),
                    Err(_) => {
                        eprintln!("Invalid seed: {}", args[i]);
                        process::exit(1);
                    }
                }
            }
            "--out" if i + 1 < args.len() => {
                i += 1;
                options.out = Some(PathBuf::from(&args[i]));
            }
            "--overwrite" => options.overwrite = true,
            "--crlf" => options.crlf = true,
            "--lenient-document" => options.lenient_document = true,
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    if options.figures.is_some() && options.game.is_some() {
        eprintln!("--figures and --game are mutually exclusive");
        process::exit(1);
    }
    options
}

fn run(options: &Options) -> Result<(), Box<dyn std::error::Error>> {
    let mut builder = ScriptGenerator::builder();
    if let Some(ref path) = options.settings {
        builder = builder.settings_file(path);
    }
    if let Some(seed) = options.seed {
        builder = builder.seed(seed);
    }
    if options.crlf {
        builder = builder.line_ending(LineEnding::CrLf);
    }
    let generator = builder.build()?;

    let knowledge = load_knowledge(options)?;
    let input = std::fs::read_to_string(&options.script)?;
    let is_yaml = Path::new(&options.script)
        .extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e == "yaml" || e == "yml");

    let output = if options.lenient_document {
        let document: serde_json::Value = if is_yaml {
            serde_yaml::from_str(&input)?
        } else {
            serde_json::from_str(&input)?
        };
        generator.generate_document(&document, knowledge.as_ref())?
    } else if is_yaml {
        generator.generate_yaml(&input, knowledge.as_ref())?
    } else {
        generator.generate_json(&input, knowledge.as_ref())?
    };

    match options.out {
        Some(ref path) => {
            FsProject.write_file(output.as_bytes(), path, options.overwrite)?;
            tracing::info!(path = %path.display(), bytes = output.len(), "wrote script");
        }
        None => print!("{}", output),
    }
    Ok(())
}

fn load_knowledge(options: &Options) -> Result<Option<CharacterKnowledgeBase>, Box<dyn std::error::Error>> {
    if let Some(ref path) = options.figures {
        let json = std::fs::read_to_string(path)?;
        return Ok(CharacterKnowledgeBase::from_json_str(&json)?.non_empty());
    }
    if let Some(ref game) = options.game {
        return Ok(FsProject.analyze_figures(Path::new(game))?.non_empty());
    }
    Ok(None)
}

fn print_usage() {
    println!("Usage: scene2script <script.json|script.yaml> [options]");
    println!();
    println!("Options:");
    println!("  --settings <file.ron>   generation options, alias and action tables");
    println!("  --figures <file.json>   character knowledge base");
    println!("  --game <dir>            scan a game directory for figures instead");
    println!("  --seed <n>              fix random tie-breaks");
    println!("  --out <file>            write to a file instead of stdout");
    println!("  --overwrite             replace an existing --out file");
    println!("  --crlf                  use CRLF line endings");
    println!("  --lenient-document      skip unrecognized statements instead of failing");
}
