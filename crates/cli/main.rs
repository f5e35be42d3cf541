use chart::map::World;
use chart::{ChartSpec, Orientation, ValueFormat};
use config::Config;
use fts::pivot::DenseMatrix;
use fts::record::FlowVec;

use clap::Parser;
use csv::Writer;
use env_logger::Env;
use log::{error, info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

mod report;

#[derive(Parser, Debug, Clone)]
#[command(version, about = "FTS funding-flow analysis for the CCCM sector", long_about = None)]
struct Args {
    #[arg(
        short = 'c',
        long = "config",
        default_value = ".fts-stat.yml",
        help = "config file"
    )]
    config: String,

    #[arg(long = "out", help = "override the configured output directory")]
    out: Option<String>,

    #[arg(
        long = "detail",
        help = "keep record-level csv file, e.g. --detail detail.csv"
    )]
    detail: Option<String>,

    #[arg(long = "no-detail", action=clap::ArgAction::SetTrue, help="do not keep record-level csv file, ignore --detail if this is set")]
    no_detail: bool,
}

pub fn write_csv<P: AsRef<Path>>(
    filename: P,
    header: Vec<String>,
    data: Vec<Vec<String>>,
) -> Result<(), Box<dyn Error>> {
    let file = File::create(&filename)?;
    let mut wtr = Writer::from_writer(file);

    wtr.write_record(header)?;

    for record in data {
        wtr.write_record(record)?;
    }
    wtr.flush()?;
    info!("CSV file written successfully: {:?}", filename.as_ref());

    Ok(())
}

fn write_detail<P: AsRef<Path>>(filename: P, flows: &FlowVec) -> Result<(), Box<dyn Error>> {
    let header = vec![
        "year".to_string(),
        "donor".to_string(),
        "organization".to_string(),
        "location".to_string(),
        "amount".to_string(),
        "agency".to_string(),
    ];
    let data = flows
        .flow_vec
        .iter()
        .map(|r| {
            vec![
                r.year.to_string(),
                r.donor.clone(),
                r.organization.clone(),
                r.location.clone(),
                r.amount.to_string(),
                r.agency.as_str().to_string(),
            ]
        })
        .collect();
    write_csv(filename, header, data)
}

/// An empty aggregate is not fatal: log and skip the artifact.
fn write_or_skip(name: &str, result: Result<(), chart::Error>) -> Result<(), Box<dyn Error>> {
    match result {
        Ok(()) => Ok(()),
        Err(chart::Error::EmptyInput) => {
            warn!("skipping {name}: empty aggregate");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}

fn keyed(rows: Vec<report::Row>) -> Vec<(String, i64)> {
    rows.into_iter().map(|r| (r.key, r.value)).collect()
}

fn bar_spec(title: String, x: &str, y: &str, orientation: Orientation, format: ValueFormat) -> ChartSpec {
    ChartSpec {
        title,
        x_label: x.to_string(),
        y_label: y.to_string(),
        orientation,
        format,
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let conf = Config::new(&args.config)?;
    let out_dir = PathBuf::from(args.out.unwrap_or_else(|| conf.output_dir.clone()));
    fs::create_dir_all(&out_dir)?;

    let flows = fts::loader::load(&conf.archive, &conf.extract)?;
    info!(
        "Total CCCM Funding: {}",
        chart::format_dollars(flows.total_amount())
    );

    if !args.no_detail {
        let detail_file = args.detail.clone().unwrap_or("detail.csv".to_string());
        info!("detail csv file: {}", detail_file);
        write_detail(&detail_file, &flows)?;
    }

    let df = report::base_frame(&flows)?;
    let aliases: Vec<(String, String)> = conf
        .aliases
        .iter()
        .map(|a| (a.from.clone(), a.to.clone()))
        .collect();

    // the pivot also fixes the reporting period for the chart titles
    let matrix = DenseMatrix::from_rows(&report::year_country_rows(&df)?);
    let first_year = matrix.years.first().copied().unwrap_or(0);
    let last_year = matrix.years.last().copied().unwrap_or(0);
    let span = format!("{first_year}-{last_year}");

    // total funding per year
    write_or_skip(
        "one.svg",
        chart::bar::render(
            &bar_spec(
                "Total CCCM Funding".to_string(),
                "Year",
                "Funding (US$)",
                Orientation::Vertical,
                ValueFormat::Currency,
            ),
            &keyed(report::rows(&report::sum_by_year(&df)?, "year", "funding")?),
            out_dir.join("one.svg"),
        ),
    )?;

    // funding per country, whole period and the two most recent years
    let all_countries = report::sum_by(&df, "location", None)?;
    write_or_skip(
        "four.svg",
        chart::bar::render(
            &bar_spec(
                format!("Funding per Country - {span}"),
                "Funding (US$)",
                "Country",
                Orientation::Horizontal,
                ValueFormat::Currency,
            ),
            &keyed(report::rows(&all_countries, "location", "funding")?),
            out_dir.join("four.svg"),
        ),
    )?;
    for (artifact, year) in [("five.svg", last_year - 1), ("six.svg", last_year)] {
        write_or_skip(
            artifact,
            chart::bar::render(
                &bar_spec(
                    format!("Funding per Country - {year}"),
                    "Funding (US$)",
                    "Country",
                    Orientation::Horizontal,
                    ValueFormat::Currency,
                ),
                &keyed(report::rows(
                    &report::sum_by(&df, "location", Some(year))?,
                    "location",
                    "funding",
                )?),
                out_dir.join(artifact),
            ),
        )?;
    }

    // choropleths: whole period and the most recent year
    let world = World::load(&conf.geometry)?;
    let funded_all: HashSet<String> = keyed(report::rows(&all_countries, "location", "funding")?)
        .into_iter()
        .map(|(k, _)| k)
        .collect();
    let n = world.matched(&funded_all, &aliases);
    write_or_skip(
        "mapall.svg",
        world.render(
            &funded_all,
            &aliases,
            &format!("{n} countries received CCCM funding between {span}"),
            out_dir.join("mapall.svg"),
        ),
    )?;
    let funded_last: HashSet<String> = keyed(report::rows(
        &report::sum_by(&df, "location", Some(last_year))?,
        "location",
        "funding",
    )?)
    .into_iter()
    .map(|(k, _)| k)
    .collect();
    let n = world.matched(&funded_last, &aliases);
    write_or_skip(
        &format!("map{last_year}.svg"),
        world.render(
            &funded_last,
            &aliases,
            &format!("{n} countries received CCCM funding in {last_year}"),
            out_dir.join(format!("map{last_year}.svg")),
        ),
    )?;

    // dense year x country heatmap
    write_or_skip(
        "seven.svg",
        chart::heatmap::render(
            "CCCM Funding by Year and Country",
            &matrix.years,
            &matrix.countries,
            &matrix.values,
            out_dir.join("seven.svg"),
        ),
    )?;

    // distinct recipient agencies and donors per year
    write_or_skip(
        "eight.svg",
        chart::bar::render(
            &bar_spec(
                "Number of CCCM Organizations".to_string(),
                "Year",
                "Number of organizations",
                Orientation::Vertical,
                ValueFormat::Count,
            ),
            &keyed(report::rows(
                &report::distinct_by_year(&df, "organization")?,
                "year",
                "count",
            )?),
            out_dir.join("eight.svg"),
        ),
    )?;
    let donors_by_year = report::rows(&report::distinct_by_year(&df, "donor")?, "year", "count")?;
    for year in [last_year - 1, last_year] {
        if let Some(row) = donors_by_year.iter().find(|r| r.key == year.to_string()) {
            info!("Number of donors in {}: {}", year, row.value);
        }
    }
    write_or_skip(
        "nine.svg",
        chart::bar::render(
            &bar_spec(
                "Number of CCCM donors".to_string(),
                "Year",
                "Number of donors",
                Orientation::Vertical,
                ValueFormat::Count,
            ),
            &keyed(donors_by_year),
            out_dir.join("nine.svg"),
        ),
    )?;

    // funding per donor, whole period and the two most recent years
    write_or_skip(
        "ten.svg",
        chart::bar::render(
            &bar_spec(
                format!("Funding per Donor - {span}"),
                "Funding (US$)",
                "Donor",
                Orientation::Horizontal,
                ValueFormat::Currency,
            ),
            &keyed(report::rows(
                &report::sum_by(&df, "donor", None)?,
                "donor",
                "funding",
            )?),
            out_dir.join("ten.svg"),
        ),
    )?;
    for (artifact, year) in [("eleven.svg", last_year - 1), ("twelve.svg", last_year)] {
        write_or_skip(
            artifact,
            chart::bar::render(
                &bar_spec(
                    format!("Funding per Donor - {year}"),
                    "Funding (US$)",
                    "Donor",
                    Orientation::Horizontal,
                    ValueFormat::Currency,
                ),
                &keyed(report::rows(
                    &report::sum_by(&df, "donor", Some(year))?,
                    "donor",
                    "funding",
                )?),
                out_dir.join(artifact),
            ),
        )?;
    }

    info!("report complete: {}", out_dir.display());
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        error!("pipeline failed: {e}");
        std::process::exit(1);
    }
}
