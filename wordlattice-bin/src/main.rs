use std::fs::File;
use std::path::PathBuf;

use anyhow::Context;
use gumdrop::Options;
use hashbrown::HashSet;
use serde::Serialize;
use smol_str::SmolStr;

use wordlattice::constants::{SENTENCE_END, SENTENCE_START};
use wordlattice::{Lattice, LatticeDecoder};

#[derive(Debug, Options)]
struct Args {
    #[options(help = "print help message")]
    help: bool,

    #[options(command)]
    command: Option<Command>,
}

#[derive(Debug, Options)]
enum Command {
    #[options(help = "re-decode a lattice with words excluded, one at a time")]
    Decode(DecodeArgs),

    #[options(help = "enumerate the paths that spell a word sequence")]
    Paths(PathsArgs),
}

#[derive(Debug, Options)]
struct DecodeArgs {
    #[options(help = "print help message")]
    help: bool,

    #[options(free, help = "SLF lattice file")]
    lattice: Option<PathBuf>,

    #[options(help = "decoder command run on each reduced lattice", required)]
    decoder: PathBuf,

    #[options(no_short, long = "exclude", help = "word to exclude from every decoding")]
    exclude_always: Vec<String>,

    #[options(
        no_short,
        long = "exclude-individually",
        help = "word to exclude on its own, or ! for every word of the base hypothesis"
    )]
    exclude_once: Vec<String>,

    #[options(no_short, long = "json", help = "output in JSON format")]
    use_json: bool,
}

#[derive(Debug, Options)]
struct PathsArgs {
    #[options(help = "print help message")]
    help: bool,

    #[options(help = "SLF lattice file", required)]
    lattice: PathBuf,

    #[options(free, help = "the word sequence to search for")]
    words: Vec<String>,
}

#[derive(Debug, Serialize)]
struct Decoding {
    #[serde(skip_serializing_if = "Option::is_none")]
    excluded: Option<String>,
    hypothesis: String,
}

fn read_lattice(path: &PathBuf) -> anyhow::Result<Lattice> {
    let file =
        File::open(path).with_context(|| format!("cannot open lattice {}", path.display()))?;
    Ok(Lattice::read_slf(file)?)
}

fn word_set<'a, I: IntoIterator<Item = &'a str>>(words: I) -> HashSet<SmolStr> {
    words.into_iter().map(SmolStr::new).collect()
}

fn decode(args: DecodeArgs) -> anyhow::Result<()> {
    let path = args
        .lattice
        .ok_or_else(|| anyhow::anyhow!("no lattice file given"))?;
    let mut lattice = read_lattice(&path)?;
    let decoder = LatticeDecoder::new(&args.decoder);

    // Sentence boundaries are part of every hypothesis and are never
    // excluded.
    let boundaries = word_set([SENTENCE_START, SENTENCE_END]);

    let exclude_always: HashSet<SmolStr> = args
        .exclude_always
        .iter()
        .map(|word| SmolStr::new(word))
        .filter(|word| !boundaries.contains(word))
        .collect();
    lattice.remove_words(&exclude_always);

    let hypothesis = decoder.decode(&lattice)?.unwrap_or_default();
    let mut results = vec![Decoding {
        excluded: None,
        hypothesis: hypothesis.clone(),
    }];

    let exclude_once: HashSet<SmolStr> = if args.exclude_once.iter().any(|word| word == "!") {
        hypothesis.split_whitespace().map(SmolStr::new).collect()
    } else {
        args.exclude_once.iter().map(SmolStr::new).collect()
    };
    let mut exclude_once: Vec<SmolStr> = exclude_once
        .into_iter()
        .filter(|word| !exclude_always.contains(word) && !boundaries.contains(word))
        .collect();
    exclude_once.sort();

    for word in exclude_once {
        let single: HashSet<SmolStr> = std::iter::once(word.clone()).collect();
        let reduced = lattice.without_words(&single);
        let hypothesis = decoder.decode(&reduced)?.unwrap_or_default();
        results.push(Decoding {
            excluded: Some(word.to_string()),
            hypothesis,
        });
    }

    if args.use_json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        for result in &results {
            match &result.excluded {
                None => println!("{}", result.hypothesis),
                Some(word) => println!("{} {}", word, result.hypothesis),
            }
        }
    }
    Ok(())
}

fn paths(args: PathsArgs) -> anyhow::Result<()> {
    let lattice = read_lattice(&args.lattice)?;
    let words: Vec<&str> = args.words.iter().map(|word| word.as_str()).collect();

    let found = lattice.find_paths(&words);
    for path in &found {
        for link in lattice.path_links(path) {
            println!(
                "{}\t{}\t{}\t{}\t{}",
                link.start_node(),
                link.end_node(),
                link.word().as_str(),
                link.ac_score(),
                link.lm_score()
            );
        }
        println!(
            "\t\t\t{}\t{}",
            path.total_ac_score(),
            path.total_lm_score()
        );
    }
    eprintln!("{} paths", found.len());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let args = Args::parse_args_default_or_exit();

    match args.command {
        None => Ok(()),
        Some(Command::Decode(args)) => decode(args),
        Some(Command::Paths(args)) => paths(args),
    }
}
