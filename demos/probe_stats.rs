use std::collections::hash_map::RandomState;

use clap::Parser;
use robin_map::HashMap;
use robin_map::MapBuilder;
use robin_map::strategy::DefaultStrategy;

#[derive(Parser, Debug)]
struct Args {
    /// Number of keys to insert.
    #[arg(short = 'n', long = "elements", default_value_t = 1000)]
    elements: usize,

    /// Load factor the map grows at.
    #[arg(short = 'l', long = "load_factor", default_value_t = 0.75)]
    load_factor: f32,

    /// Presize the map for `elements` keys instead of growing from the
    /// default capacity.
    #[arg(short = 'p', long = "presize")]
    presize: bool,

    /// Remove every other key after filling the map.
    #[arg(short = 'r', long = "remove_half")]
    remove_half: bool,
}

fn main() {
    let args = Args::parse();

    let builder = MapBuilder::new()
        .strategy(DefaultStrategy::with_hasher(RandomState::new()))
        .load_factor(args.load_factor);
    let builder = if args.presize {
        builder.expected_elements(args.elements)
    } else {
        builder
    };

    let mut map: HashMap<u64, u64, _> = match builder.build() {
        Ok(map) => map,
        Err(e) => {
            eprintln!("Cannot create map: {e}");
            std::process::exit(1);
        }
    };

    println!(
        "Created map with {} slots (grows at {} entries)",
        map.capacity(),
        map.resize_threshold()
    );

    let mut growths = 0;
    for i in 0..args.elements as u64 {
        let before = map.capacity();
        map.insert(i, i);
        if map.capacity() != before {
            growths += 1;
        }
    }

    println!(
        "Inserted {} keys, grew {} times to {} slots",
        map.len(),
        growths,
        map.capacity()
    );

    if args.remove_half {
        let removed = map.remove_all(|k, _| k % 2 == 0);
        println!("Removed {} keys, {} remain", removed, map.len());
    }

    map.table().print_probe_histogram();
    map.table().debug_stats().print();
}
