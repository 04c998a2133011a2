use std::path::{Path, PathBuf};
use std::process;

use chrono::{Local, TimeZone};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use loopchamber::{
    ConnectionType, DEFAULT_MATRIX_SIZE, DEFAULT_PAIR_LIMIT, DEFAULT_PAIR_THRESHOLD,
    DEFAULT_TOP_LIMIT, Emotion, EmotionDistribution, ListParams, Memory, MemoryError, MemoryType,
    PairParams, Scorer, SortBy, db, default_db_path,
};

/// Sort order for `list`
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum SortOption {
    /// Newest first
    #[default]
    Newest,
    /// Oldest first
    Oldest,
    /// Highest pitch first
    Pitch,
    /// Highest dissonance first
    Dissonance,
    /// Highest tempo first
    Tempo,
}

impl From<SortOption> for SortBy {
    fn from(option: SortOption) -> Self {
        match option {
            SortOption::Newest => SortBy::Newest,
            SortOption::Oldest => SortBy::Oldest,
            SortOption::Pitch => SortBy::Pitch,
            SortOption::Dissonance => SortBy::Dissonance,
            SortOption::Tempo => SortBy::Tempo,
        }
    }
}

#[derive(Parser)]
#[command(name = "loopchamber")]
#[command(about = "Score memories and surface the tension between them", long_about = None)]
struct Cli {
    /// Path to the database file (default: ~/.loopchamber.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Output in JSON format (default is compact text)
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database (creates if not exists)
    Init,

    /// Score a new memory against the collection and store it
    Add {
        /// The memory text
        content: String,

        /// Memory type: insight, observation, question, reflection, event (others allowed)
        #[arg(short = 't', long = "type", default_value = "observation")]
        memory_type: String,
    },

    /// Score text without storing it
    Score {
        /// The text to score
        content: String,

        /// Memory type
        #[arg(short = 't', long = "type", default_value = "observation")]
        memory_type: String,
    },

    /// Show the latest N memories
    Tail {
        /// Number of memories to show (default: 10)
        #[arg(default_value_t = 10)]
        n: usize,
    },

    /// Browse memories filtered by type and emotion
    List {
        /// Only these memory types (repeatable)
        #[arg(short = 't', long = "type")]
        types: Vec<String>,

        /// Only these emotions: positive, negative, neutral, complex (repeatable)
        #[arg(short, long = "emotion")]
        emotions: Vec<String>,

        /// Sort order
        #[arg(short, long, value_enum, default_value_t = SortOption::Newest)]
        sort: SortOption,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show a single memory by ID
    Show {
        /// Memory ID
        id: String,
    },

    /// Connect two memories
    Connect {
        /// Source memory ID
        source: String,

        /// Target memory ID
        target: String,

        /// Connection type: related, contradicts, supports, questions, expands
        #[arg(short = 't', long = "type", default_value = "related")]
        connection_type: String,

        /// Connection strength in [0.1, 1.0]
        #[arg(short, long, default_value_t = 0.5)]
        strength: f64,
    },

    /// List all connections
    Connections,

    /// Re-score every memory against the full collection
    Refresh,

    /// Show the most dissonant memory pairs
    Pairs {
        /// Maximum number of pairs to return
        #[arg(short, long, default_value_t = DEFAULT_PAIR_LIMIT)]
        limit: usize,

        /// Minimum pair score (exclusive)
        #[arg(long, default_value_t = DEFAULT_PAIR_THRESHOLD)]
        threshold: f64,
    },

    /// Connect the most dissonant pairs with `contradicts` edges
    Discover {
        /// Maximum number of pairs to consider
        #[arg(short, long, default_value_t = DEFAULT_PAIR_LIMIT)]
        limit: usize,

        /// Minimum pair score (exclusive)
        #[arg(long, default_value_t = DEFAULT_PAIR_THRESHOLD)]
        threshold: f64,
    },

    /// Show memories with the highest dissonance
    Top {
        #[arg(default_value_t = DEFAULT_TOP_LIMIT)]
        n: usize,
    },

    /// Show the pairwise dissonance matrix of the first N memories
    Matrix {
        #[arg(default_value_t = DEFAULT_MATRIX_SIZE)]
        n: usize,
    },

    /// Show collection statistics
    Stats,

    /// Show emotion counts per day
    Timeline,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let db_path = cli.db.unwrap_or_else(default_db_path);
    let command = cli.command.unwrap_or(Commands::Tail { n: 10 });

    if let Err(e) = run(command, &db_path, cli.json) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(
    command: Commands,
    db_path: &Path,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = db::open(db_path)?;
    let mut store = db::load(&conn)?;
    let scorer = Scorer::new();

    match command {
        Commands::Init => {
            if json_output {
                let result = serde_json::json!({
                    "success": true,
                    "database": db_path.display().to_string(),
                    "memory_count": store.len(),
                });
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!(
                    "SUCCESS: Database initialized at {} ({} memories)",
                    db_path.display(),
                    store.len()
                );
            }
        }

        Commands::Add {
            content,
            memory_type,
        } => {
            let result = store.ingest(&scorer, &content, MemoryType::from(memory_type))?;
            db::save(&mut conn, &store)?;
            if json_output {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_memory(&result.memory);
            }
        }

        Commands::Score {
            content,
            memory_type,
        } => {
            let attrs = scorer.score(
                &content,
                &MemoryType::from(memory_type),
                store.get_all_memories(),
            );
            if json_output {
                println!("{}", serde_json::to_string_pretty(&attrs)?);
            } else {
                println!(
                    "pitch: {:.2} | dissonance: {:.2} | tempo: {:.2} | emotion: {}",
                    attrs.pitch, attrs.dissonance, attrs.tempo, attrs.emotion
                );
            }
        }

        Commands::Tail { n } => {
            let memories = store.tail(n);
            if json_output {
                let result = serde_json::json!({
                    "count": memories.len(),
                    "memories": memories
                });
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                for m in memories {
                    print_memory(m);
                }
            }
        }

        Commands::List {
            types,
            emotions,
            sort,
            limit,
        } => {
            let params = ListParams {
                types: types.into_iter().map(MemoryType::from).collect(),
                emotions: emotions
                    .iter()
                    .map(|e| e.parse::<Emotion>())
                    .collect::<Result<_, _>>()?,
                sort: sort.into(),
                limit,
            };
            let memories = store.list(&params);
            if json_output {
                let result = serde_json::json!({
                    "count": memories.len(),
                    "memories": memories
                });
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                for m in memories {
                    print_memory(m);
                }
            }
        }

        Commands::Show { id } => {
            let memory = store
                .get(&id)
                .ok_or_else(|| MemoryError::Reference(id.clone()))?;
            if json_output {
                println!("{}", serde_json::to_string_pretty(memory)?);
            } else {
                print_memory(memory);
            }
        }

        Commands::Connect {
            source,
            target,
            connection_type,
            strength,
        } => {
            let connection_type: ConnectionType = connection_type.parse()?;
            let id = store.create_connection(&source, &target, connection_type, strength)?;
            db::save(&mut conn, &store)?;
            if json_output {
                let result = serde_json::json!({ "id": id });
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!(
                    "CONNECTED: {} -[{} {:.2}]-> {} ({})",
                    source, connection_type, strength, target, id
                );
            }
        }

        Commands::Connections => {
            let connections = store.get_connections();
            if json_output {
                let result = serde_json::json!({
                    "count": connections.len(),
                    "connections": connections
                });
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                for c in connections {
                    println!(
                        "  {} -[{} {:.2}]-> {}",
                        c.source, c.connection_type, c.strength, c.target
                    );
                }
            }
        }

        Commands::Refresh => {
            let result = store.refresh_tempo(&scorer);
            db::save(&mut conn, &store)?;
            if json_output {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!(
                    "REFRESHED {} memories ({} changed)",
                    result.refreshed, result.changed
                );
            }
        }

        Commands::Pairs { limit, threshold } => {
            let pairs = store.dissonant_pairs(&PairParams { limit, threshold });
            if json_output {
                let result = serde_json::json!({
                    "count": pairs.len(),
                    "pairs": pairs
                });
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else if pairs.is_empty() {
                println!("No significantly dissonant memory pairs found.");
            } else {
                for p in &pairs {
                    println!("=== Pair with dissonance {:.2} ===", p.score);
                    print_memory(p.first);
                    print_memory(p.second);
                }
            }
        }

        Commands::Discover { limit, threshold } => {
            let result = store.connect_dissonant_pairs(&PairParams { limit, threshold })?;
            db::save(&mut conn, &store)?;
            if json_output {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("DISCOVERED {} connections:", result.created.len());
                for c in &result.created {
                    println!("  {} <-> {} (strength: {:.2})", c.source, c.target, c.strength);
                }
                if !result.skipped.is_empty() {
                    println!("SKIPPED {} already connected pairs", result.skipped.len());
                }
            }
        }

        Commands::Top { n } => {
            let memories = store.top_dissonant_memories(n);
            if json_output {
                let result = serde_json::json!({
                    "count": memories.len(),
                    "memories": memories
                });
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                for m in memories {
                    print_memory(m);
                }
            }
        }

        Commands::Matrix { n } => {
            let matrix = store.dissonance_matrix(n);
            if json_output {
                println!("{}", serde_json::to_string_pretty(&matrix)?);
            } else {
                let labels: Vec<String> =
                    (1..=matrix.ids.len()).map(|i| format!("M{}", i)).collect();
                let header: String = labels.iter().map(|l| format!("{:>5}", l)).collect();
                println!("     {}", header);
                for (label, row) in labels.iter().zip(&matrix.scores) {
                    let cells: String = row.iter().map(|s| format!("{:>5.2}", s)).collect();
                    println!("{:<5}{}", label, cells);
                }
                println!();
                for (label, id) in labels.iter().zip(&matrix.ids) {
                    println!("  {} = {}", label, id);
                }
            }
        }

        Commands::Stats => {
            let stats = store.stats();
            if json_output {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("STATS:");
                println!("  Memories:    {}", stats.memory_count);
                println!("  Connections: {}", stats.connection_count);
                for (kind, count) in &stats.connection_types {
                    println!("    {:<12} {}", kind, count);
                }
                println!("  Emotions:    {}", format_emotions(&stats.emotions));
                if let (Some(p), Some(d), Some(t)) =
                    (stats.avg_pitch, stats.avg_dissonance, stats.avg_tempo)
                {
                    println!(
                        "  Averages:    pitch {:.2} | dissonance {:.2} | tempo {:.2}",
                        p, d, t
                    );
                }
            }
        }

        Commands::Timeline => {
            let timeline = store.timeline();
            if json_output {
                println!("{}", serde_json::to_string_pretty(&timeline)?);
            } else {
                println!("TIMELINE:");
                for b in timeline.buckets {
                    println!(
                        "  {} | count: {:>4} | {}",
                        b.date,
                        b.count,
                        format_emotions(&b.emotions)
                    );
                }
            }
        }
    }

    Ok(())
}

/// Format datetime in the local timezone
fn format_datetime(dt: &chrono::DateTime<chrono::Utc>) -> String {
    Local
        .from_utc_datetime(&dt.naive_utc())
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

/// Format emotion counts as `positive 2 | negative 0 | ...`
fn format_emotions(dist: &EmotionDistribution) -> String {
    Emotion::all()
        .iter()
        .map(|e| format!("{} {}", e, dist.get(*e)))
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Format a memory for text output
fn print_memory(m: &Memory) {
    let a = &m.attributes;
    println!(
        "--- {} | {} | {} | p {:.2} d {:.2} t {:.2} {} ---\n{}",
        m.id,
        format_datetime(&m.created_at),
        m.memory_type,
        a.pitch,
        a.dissonance,
        a.tempo,
        a.emotion,
        m.content
    );
}
