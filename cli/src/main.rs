#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod output;

use abstutil::{prettyprint_usize, Timer};
use anyhow::Result;
use structopt::StructOpt;

use bikeshare::{LoadOptions, Network};
use model::{MinuteOfDay, TimeFilter, TrafficModel, MINUTES_PER_DAY};

use self::output::Format;

#[derive(StructOpt)]
struct Args {
    /// The path to the station list, as JSON
    #[structopt(long)]
    stations: String,
    /// The path to a CSV file of trips
    #[structopt(long)]
    trips: String,
    /// Only count trips within an hour of this time of day, like 08:30
    #[structopt(long)]
    time: Option<MinuteOfDay>,
    /// Like --time, but a minute of the day from 0 to 1439. -1 means no filter.
    #[structopt(long, allow_hyphen_values = true, conflicts_with = "time")]
    minute: Option<i32>,
    /// csv or geojson
    #[structopt(long, default_value = "csv")]
    format: Format,
    /// Where to write the stations. Defaults to stdout.
    #[structopt(long)]
    output: Option<String>,
    /// Fail if any trip has an unusable timestamp or a repeated ride ID, instead of skipping it
    #[structopt(long)]
    strict: bool,
    /// Before writing output, log the busiest stations for every N minutes of the day
    #[structopt(long)]
    sweep_every: Option<usize>,
    /// How many stations to log per time when sweeping
    #[structopt(long, default_value = "5")]
    top: usize,
}

impl Args {
    fn filter(&self) -> Result<TimeFilter> {
        match (self.time, self.minute) {
            (Some(time), None) => Ok(TimeFilter::Around(time)),
            (None, Some(minute)) => TimeFilter::from_slider(minute),
            (None, None) => Ok(TimeFilter::None),
            (Some(_), Some(_)) => bail!("Specify only one of --time and --minute"),
        }
    }
}

fn main() -> Result<()> {
    abstutil::logger::setup();

    let args = Args::from_iter(abstutil::cli_args());
    run(args)
}

fn run(args: Args) -> Result<()> {
    // Check this before spending time loading
    let filter = args.filter()?;

    let mut timer = Timer::new("load bike-share network");
    let (network, _) = Network::load_from_paths(
        &args.stations,
        &args.trips,
        &LoadOptions {
            strict: args.strict,
        },
        &mut timer,
    )?;
    let mut model = TrafficModel::new(network);

    if let Some(step) = args.sweep_every {
        sweep(&mut model, step, args.top)?;
    }

    let snapshot = model.set_filter(filter);
    info!(
        "Traffic {}: {} departures and {} arrivals",
        filter.describe(),
        prettyprint_usize(snapshot.total_departures()),
        prettyprint_usize(snapshot.total_arrivals())
    );

    let network = model.network();
    let snapshot = model.snapshot();
    match args.output {
        Some(ref path) => {
            let file = fs_err::File::create(path)?;
            output::write(std::io::BufWriter::new(file), args.format, network, snapshot)?;
            info!("Wrote {path}");
        }
        None => {
            output::write(std::io::stdout().lock(), args.format, network, snapshot)?;
        }
    }
    Ok(())
}

// Steps through the day like the time slider would
fn sweep(model: &mut TrafficModel, step: usize, top: usize) -> Result<()> {
    if step == 0 {
        bail!("--sweep-every must be positive");
    }
    for minute in (0..MINUTES_PER_DAY).step_by(step) {
        let minute = MinuteOfDay::new(minute)?;
        model.set_filter(TimeFilter::Around(minute));

        let network = model.network();
        let snapshot = model.snapshot();
        let busiest: Vec<String> = snapshot
            .busiest(top)
            .into_iter()
            .filter(|s| s.total_traffic > 0)
            .map(|s| {
                format!(
                    "{} ({})",
                    network.stations[s.station].describe(),
                    prettyprint_usize(s.total_traffic)
                )
            })
            .collect();
        info!(
            "{minute}: {} departures. Busiest: {}",
            prettyprint_usize(snapshot.total_departures()),
            busiest.join(", ")
        );
    }
    Ok(())
}
