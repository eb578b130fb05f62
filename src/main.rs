use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use lecture_hours_analyzer::aggregator::{aggregate, Aggregation, RowFilter};
use lecture_hours_analyzer::analyzer::{Analysis, FilterFacets, LectureAnalyzer};
use lecture_hours_analyzer::models::{Config, FilterConfig};
use lecture_hours_analyzer::report;
use lecture_hours_analyzer::sheets::WorkbookReader;
use std::fs;
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("lecture-hours-analyzer")
        .version("1.0")
        .about("Totals lecture hours per instructor from medical curriculum committee (kurul) sheets")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("config.toml"),
        )
        .arg(
            Arg::new("instructor")
                .long("instructor")
                .value_name("NAME")
                .help("Only this instructor (canonical display name)"),
        )
        .arg(
            Arg::new("term")
                .long("term")
                .value_name("TERM")
                .action(ArgAction::Append)
                .help("Only these term labels (repeatable)"),
        )
        .arg(
            Arg::new("committee")
                .long("committee")
                .value_name("SHEET")
                .action(ArgAction::Append)
                .help("Only these committee sheets (repeatable)"),
        )
        .arg(
            Arg::new("course")
                .long("course")
                .value_name("COURSE")
                .action(ArgAction::Append)
                .help("Only these course names (repeatable)"),
        )
        .arg(
            Arg::new("branch")
                .long("branch")
                .value_name("KEYWORD")
                .help("Only rows whose course name, course title or committee mentions this branch"),
        )
        .arg(
            Arg::new("list-branches")
                .long("list-branches")
                .action(ArgAction::SetTrue)
                .help("Print the available filter values and exit"),
        )
}

/// Command-line selections replace the matching `[filters]` entries of the config.
fn merge_filters(config: &FilterConfig, matches: &clap::ArgMatches) -> FilterConfig {
    let many = |id: &str, fallback: &Vec<String>| -> Vec<String> {
        match matches.get_many::<String>(id) {
            Some(values) => values.cloned().collect(),
            None => fallback.clone(),
        }
    };

    FilterConfig {
        instructor: matches
            .get_one::<String>("instructor")
            .cloned()
            .or_else(|| config.instructor.clone()),
        terms: many("term", &config.terms),
        committees: many("committee", &config.committees),
        courses: many("course", &config.courses),
        branch: matches
            .get_one::<String>("branch")
            .cloned()
            .or_else(|| config.branch.clone()),
    }
}

fn print_facets(facets: &FilterFacets) {
    let section = |title: &str, values: &[String]| {
        println!("\n{} ({}):", title, values.len());
        for value in values {
            println!("   - {}", value);
        }
    };
    section("👨‍🏫 Instructors", &facets.instructors);
    section("📅 Terms", &facets.terms);
    section("🏛️  Committees", &facets.committees);
    section("📚 Courses", &facets.courses);
    section("🩺 Branch keywords", &facets.branches);
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();
    let config_file = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or("config.toml");

    // Load or create configuration
    let config = if Path::new(config_file).exists() {
        println!("📋 Loading configuration from: {}", config_file);
        Config::load_from_file(config_file)?
    } else {
        println!("📝 Creating default configuration file: {}", config_file);
        let default_config = Config::default();
        default_config.save_to_file(config_file)?;
        println!("⚠️  Please review {} (data directory, term labels), then run the program again.", config_file);
        return Ok(());
    };

    let output_dir = config.output_directory.as_deref().unwrap_or("output");
    let filters = merge_filters(&config.filters, &matches);

    let analyzer = LectureAnalyzer::new(&config);
    let sources = analyzer.load_sources(&WorkbookReader::new()).await?;
    report::print_warnings(&sources.warnings);

    let analysis: Analysis = match analyzer.analyze(&sources.workbooks) {
        Ok(analysis) => analysis,
        Err(e) => {
            println!("❌ {}", e);
            return Err(e.into());
        }
    };

    if matches.get_flag("list-branches") {
        print_facets(&analysis.facets());
        return Ok(());
    }

    let filter = RowFilter::from_config(&filters);
    let filtered = filter.apply(analysis.rows());

    fs::create_dir_all(output_dir)?;
    report::clean_output_directory(output_dir)?;

    match aggregate(&filtered) {
        Aggregation::NoMatchingRows => {
            println!("\n🔍 No matching rows for the selected filters; no reports written.");
        }
        Aggregation::Tables(tables) => {
            report::write_reports(&tables, &filtered, &analysis.branch_terms, output_dir)?;
            report::print_summary(&analysis, &tables, filtered.len());
            println!("\n✅ Analysis complete!");
            println!("📂 Results: {}", output_dir);
        }
    }

    Ok(())
}
