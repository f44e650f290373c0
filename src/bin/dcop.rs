//! DCOP CLI binary.
//!
//! Generates an instance, solves it with MGM, and optionally explains the
//! result against a counterfactual no-good.
//!
//! # Commands
//!
//! - `solve` - Generate and solve an instance
//! - `explain` - Solve, then compare against a category-restricted no-good

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use dcop::{
    generate, AgentId, Config, Dcop, ExplainMode, Explanation, Problem, ProblemKind, Value,
    VERSION,
};

#[derive(Parser)]
#[command(name = "dcop")]
#[command(version = VERSION)]
#[command(about = "DCOP - MGM solver with contrastive explanations", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate and solve an instance
    Solve {
        #[command(flatten)]
        problem: ProblemArgs,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Solve, then explain the result against a no-good
    Explain {
        #[command(flatten)]
        problem: ProblemArgs,

        /// Agents kept at their context value (category 1)
        #[arg(long, value_delimiter = ',')]
        fixed: Vec<AgentId>,

        /// Agents barred from their context value (category 2)
        #[arg(long, value_delimiter = ',')]
        exclude: Vec<AgentId>,

        /// Agents forced to a new value, as id=value (category 3)
        #[arg(long, value_delimiter = ',', value_parser = parse_force)]
        force: Vec<(AgentId, Value)>,

        /// Agents left fully free (category 4)
        #[arg(long, value_delimiter = ',')]
        free: Vec<AgentId>,

        /// Tell the story of each change
        #[arg(long)]
        narrative: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct ProblemArgs {
    /// Problem kind (sparse, dense, coloring, meetings)
    #[arg(short, long)]
    kind: Option<ProblemKind>,

    /// Agents (participants for meeting scheduling)
    #[arg(short, long)]
    agents: Option<usize>,

    /// Domain size (time slots for meeting scheduling)
    #[arg(short, long)]
    domain_size: Option<usize>,

    /// Number of meetings
    #[arg(short, long)]
    meetings: Option<usize>,

    /// Edge probability for random graphs
    #[arg(long)]
    density: Option<f64>,

    /// RNG seed
    #[arg(short, long)]
    seed: Option<u64>,

    /// Round bound
    #[arg(long)]
    max_rounds: Option<u64>,
}

impl ProblemArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(kind) = self.kind {
            config.problem.kind = kind;
        }
        if let Some(agents) = self.agents {
            config.problem.agents = agents;
        }
        if let Some(domain_size) = self.domain_size {
            config.problem.domain_size = domain_size;
        }
        if let Some(meetings) = self.meetings {
            config.problem.meetings = meetings;
        }
        if self.density.is_some() {
            config.problem.density = self.density;
        }
        if let Some(seed) = self.seed {
            config.problem.seed = seed;
        }
        if let Some(max_rounds) = self.max_rounds {
            config.solver.max_rounds = max_rounds;
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::from_env();
    if let Some(path) = &cli.config {
        let file = Config::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?;
        config = config.merge(file);
    }

    match cli.command {
        Commands::Solve { problem, json } => {
            problem.apply(&mut config);
            cmd_solve(&config, json)
        },
        Commands::Explain {
            problem,
            fixed,
            exclude,
            force,
            free,
            narrative,
            json,
        } => {
            problem.apply(&mut config);
            let mode = if narrative {
                ExplainMode::Narrative
            } else {
                ExplainMode::Technical
            };
            cmd_explain(&config, fixed, exclude, force, free, mode, json)
        },
    }
}

fn cmd_solve(config: &Config, json_output: bool) -> anyhow::Result<()> {
    let Problem { graph, scenario } = generate(&config.problem)?;
    let name = graph.name().to_string();
    let mut dcop = Dcop::new(graph, config.solver.clone())?;
    let summary = dcop.execute()?;

    if json_output {
        let output = serde_json::json!({
            "name": name,
            "algorithm": dcop.algorithm().to_string(),
            "rounds": summary.rounds,
            "commits": summary.commits,
            "initial_cost": summary.initial_cost,
            "final_cost": summary.final_cost,
            "assignment": dcop.assignment(),
            "history": dcop.history(),
            "scenario": scenario,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if let Some(scenario) = &scenario {
        println!("{scenario}");
    }
    println!("{name} solved by {}", dcop.algorithm());
    println!("  Rounds:       {}", summary.rounds);
    println!("  Commits:      {}", summary.commits);
    println!("  Initial cost: {}", summary.initial_cost);
    println!("  Final cost:   {}", summary.final_cost);
    println!();
    println!("Assignment:");
    for (id, value) in dcop.assignment() {
        println!("  A_{id} = {value}");
    }
    Ok(())
}

fn cmd_explain(
    config: &Config,
    fixed: Vec<AgentId>,
    exclude: Vec<AgentId>,
    force: Vec<(AgentId, Value)>,
    free: Vec<AgentId>,
    mode: ExplainMode,
    json_output: bool,
) -> anyhow::Result<()> {
    let Problem { graph, scenario } = generate(&config.problem)?;
    let mut dcop = Dcop::new(graph, config.solver.clone())?;
    dcop.execute().context("solving the context")?;

    let mut explanation = Explanation::from_sets(&mut dcop, fixed, exclude, force, free)?;
    explanation.update_agents_before_generate_no_good()?;
    explanation
        .generate_no_good()
        .context("solving the no-good")?;
    let report = explanation.explain(mode)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        if let Some(scenario) = &scenario {
            println!("{scenario}");
        }
        print!("{report}");
    }
    Ok(())
}

fn parse_force(s: &str) -> Result<(AgentId, Value), String> {
    let (id, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected id=value, got '{s}'"))?;
    let id = id
        .trim()
        .parse()
        .map_err(|e| format!("bad agent id '{id}': {e}"))?;
    let value = value
        .trim()
        .parse()
        .map_err(|e| format!("bad value '{value}': {e}"))?;
    Ok((id, value))
}
