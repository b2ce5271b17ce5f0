//! FastPeakMap CLI entry point
//!
//! Locates peak centers on genes, transcripts and transcript elements.

use clap::{Args, Parser, Subcommand};
use fast_peakmap::core::{
    dedup_hits, write_hits, AnnotationIndex, AnnotationLoader, ElementPriority, PeakLocator,
    PriorityPair, Strand,
};
use fast_peakmap::formats::{read_peaks_path, Peak};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "fast-peakmap")]
#[command(about = "Locate peaks on gene structure using a nested interval index")]
#[command(version)]
#[command(author = "FastPeakMap Contributors")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that loads an annotation
#[derive(Args)]
struct AnnotationArgs {
    /// GTF annotation (plain, .gz or .bz2)
    gtf: PathBuf,
    /// Feature kind to index with its priority, e.g. CDS=3 (repeatable; default:
    /// stop_codon=1, three_prime_utr=2, CDS=3, five_prime_utr=4)
    #[arg(short = 'e', long = "element")]
    elements: Vec<PriorityPair>,
    /// Fail if a chromosome, gene or transcript reappears after its group ended
    #[arg(long = "strict-order")]
    strict_order: bool,
}

impl AnnotationArgs {
    fn priorities(&self) -> ElementPriority {
        if self.elements.is_empty() {
            ElementPriority::default()
        } else {
            self.elements.iter().cloned().collect()
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Locate every peak of a BED file
    Locate {
        #[command(flatten)]
        annotation: AnnotationArgs,
        /// Input BED peak file
        peaks: PathBuf,
        /// Output TSV file (optional, stdout if not specified)
        output: Option<PathBuf>,
        /// Number of threads
        #[arg(short = 't', long, default_value = "1")]
        threads: usize,
        /// Keep one hit per peak and priority
        #[arg(short = 'u', long)]
        unique: bool,
    },
    /// Look up a single position
    Query {
        #[command(flatten)]
        annotation: AnnotationArgs,
        /// Chromosome name
        chrom: String,
        /// Strand (+ or -)
        #[arg(allow_hyphen_values = true)]
        strand: Strand,
        /// 1-based position
        position: u64,
    },
    /// Print index statistics
    Stats {
        #[command(flatten)]
        annotation: AnnotationArgs,
    },
}

fn load_annotation(args: &AnnotationArgs, priorities: ElementPriority) -> anyhow::Result<AnnotationIndex> {
    let start = Instant::now();
    eprintln!("Loading annotation: {:?}", args.gtf);

    let index = AnnotationLoader::new(priorities)
        .with_order_validation(args.strict_order)
        .load_path(&args.gtf)
        .map_err(|e| anyhow::anyhow!("Failed to load annotation: {}", e))?;

    eprintln!("Annotation loaded in {:.2}s", start.elapsed().as_secs_f64());
    Ok(index)
}

fn open_output(output: Option<&PathBuf>) -> anyhow::Result<Box<dyn Write>> {
    Ok(match output {
        Some(path) => Box::new(BufWriter::with_capacity(128 * 1024, File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    })
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let start = Instant::now();

    match cli.command {
        Commands::Locate { annotation, peaks, output, threads, unique } => {
            let priorities = annotation.priorities();
            let index = load_annotation(&annotation, priorities.clone())?;

            eprintln!("Reading peaks: {:?}", peaks);
            let peaks = read_peaks_path(&peaks)?;

            let locator = PeakLocator::new(&index, &priorities);
            let (mut hits, stats) = locator.locate_all(&peaks, threads)?;
            if unique {
                hits = dedup_hits(hits);
            }

            let mut writer = open_output(output.as_ref())?;
            write_hits(&mut writer, &hits)?;
            writer.flush()?;

            eprintln!("\n=== Locate Statistics ===");
            eprintln!("Total peaks:     {}", stats.peaks);
            eprintln!("Located:         {}", stats.located);
            eprintln!("Unlocated:       {}", stats.peaks - stats.located);
            eprintln!("Hits written:    {}", hits.len());
            eprintln!("Time elapsed:    {:.2}s", start.elapsed().as_secs_f64());
        }

        Commands::Query { annotation, chrom, strand, position } => {
            let priorities = annotation.priorities();
            let index = load_annotation(&annotation, priorities.clone())?;

            let point = Peak {
                chrom,
                start: position.saturating_sub(1),
                end: position,
                strand,
                center: position,
                length: 1,
            };
            let hits = PeakLocator::new(&index, &priorities).locate(&point);
            if hits.is_empty() {
                eprintln!("No element contains {}:{}({})", point.chrom, position, strand);
            }

            let mut writer = open_output(None)?;
            write_hits(&mut writer, &hits)?;
            writer.flush()?;
        }

        Commands::Stats { annotation } => {
            let index = load_annotation(&annotation, annotation.priorities())?;
            let summary = index.summary();

            let mut chroms: Vec<&str> = index.chromosomes().collect();
            chroms.sort_unstable();

            println!("chrom\tstrand\tspan\tgenes\tdepth");
            for chrom in chroms {
                let Some(entry) = index.get(chrom) else {
                    continue;
                };
                for strand in [Strand::Plus, Strand::Minus] {
                    let slot = entry.strand(strand);
                    let span = slot
                        .spanning_interval()
                        .map_or_else(|| ".".to_string(), |s| s.to_string());
                    println!(
                        "{}\t{}\t{}\t{}\t{}",
                        chrom,
                        strand,
                        span,
                        slot.gene_tree().len(),
                        slot.gene_tree().depth()
                    );
                }
            }

            eprintln!("\n=== Index Statistics ===");
            eprintln!("Chromosomes:     {}", summary.chromosomes);
            eprintln!("Genes:           {}", summary.genes);
            eprintln!("Transcripts:     {}", summary.transcripts);
            eprintln!("Elements:        {}", summary.elements);
            eprintln!("Time elapsed:    {:.2}s", start.elapsed().as_secs_f64());
        }
    }

    Ok(())
}
