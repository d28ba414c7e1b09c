//
// Copyright (c) 2017, 2020 ADLINK Technology Inc.
//
// This program and the accompanying materials are made available under the
// terms of the Eclipse Public License 2.0 which is available at
// http://www.eclipse.org/legal/epl-2.0, or the Apache License, Version 2.0
// which is available at https://www.apache.org/licenses/LICENSE-2.0.
//
// SPDX-License-Identifier: EPL-2.0 OR Apache-2.0
//
// Contributors:
//   ADLINK zenoh team, <zenoh@adlink-labs.tech>
//
//! A thin `clap`-driven wrapper over the `zlite` library, in the same spirit
//! as the teacher's `zenohd`/`z_pong.rs`: parse args into a [`Config`],
//! `zlite::open` it, run one of `put`/`sub`/`query`/`eval`, exit with the
//! code `spec.md` §6 specifies.
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};

use zlite::{Config, ConsolidationMode, QueryArgs, SubInfo, ZError, ZErrorKind};
use zlite_core::config::keys;

const EXIT_SUCCESS: i32 = 0;
const EXIT_CONFIG_ERROR: i32 = 1;
const EXIT_CONNECTION_FAILURE: i32 = 2;
const EXIT_RUNTIME_ERROR: i32 = 3;

fn main() {
    env_logger::init();
    std::process::exit(run());
}

fn common_args<'a, 'b>() -> Vec<Arg<'a, 'b>> {
    vec![
        Arg::with_name("peer")
            .short("e")
            .long("peer")
            .takes_value(true)
            .value_name("LOCATOR")
            .help("Locator of the router to connect to, e.g. tcp/127.0.0.1:7447"),
        Arg::with_name("no-multicast-scouting")
            .long("no-multicast-scouting")
            .help("Disable multicast scouting even when no --peer is given"),
        Arg::with_name("scouting-timeout")
            .long("scouting-timeout")
            .takes_value(true)
            .value_name("SECONDS")
            .help("How long to scout for a router before giving up"),
    ]
}

fn build_config(args: &ArgMatches) -> Config {
    let mut config = Config::new();
    config.insert(keys::MODE.to_string(), "client".to_string());
    if let Some(peer) = args.value_of("peer") {
        config.insert(keys::PEER.to_string(), peer.to_string());
    }
    if args.is_present("no-multicast-scouting") {
        config.insert(keys::MULTICAST_SCOUTING.to_string(), "false".to_string());
    }
    if let Some(timeout) = args.value_of("scouting-timeout") {
        config.insert(keys::SCOUTING_TIMEOUT.to_string(), timeout.to_string());
    }
    config
}

fn exit_code_for(err: &ZError) -> i32 {
    match err.kind() {
        ZErrorKind::ParseError { .. } => EXIT_CONFIG_ERROR,
        ZErrorKind::IoError { .. } | ZErrorKind::Timeout { .. } => EXIT_CONNECTION_FAILURE,
        _ => EXIT_RUNTIME_ERROR,
    }
}

fn run() -> i32 {
    let matches = App::new("zlite")
        .about("A lightweight zenoh-flavoured pub/sub and query client")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("put")
                .about("Write a payload to a key expression")
                .args(&common_args())
                .arg(Arg::with_name("KEY").required(true).index(1))
                .arg(Arg::with_name("VALUE").required(true).index(2)),
        )
        .subcommand(
            SubCommand::with_name("sub")
                .about("Subscribe to a key expression and print incoming samples")
                .args(&common_args())
                .arg(Arg::with_name("KEY").required(true).index(1)),
        )
        .subcommand(
            SubCommand::with_name("query")
                .about("Issue a query and print every collected reply")
                .args(&common_args())
                .arg(Arg::with_name("KEY").required(true).index(1))
                .arg(Arg::with_name("PREDICATE").default_value("").index(2)),
        )
        .subcommand(
            SubCommand::with_name("eval")
                .about("Declare a queryable that echoes the query's predicate back")
                .args(&common_args())
                .arg(Arg::with_name("KEY").required(true).index(1)),
        )
        .get_matches();

    match matches.subcommand() {
        ("put", Some(m)) => cmd_put(m),
        ("sub", Some(m)) => cmd_sub(m),
        ("query", Some(m)) => cmd_query(m),
        ("eval", Some(m)) => cmd_eval(m),
        _ => EXIT_CONFIG_ERROR,
    }
}

fn cmd_put(args: &ArgMatches) -> i32 {
    let config = build_config(args);
    let key = args.value_of("KEY").unwrap().to_string();
    let value = args.value_of("VALUE").unwrap().to_string();

    let session = match zlite::open(&config) {
        Ok(s) => s,
        Err(e) => return report(e),
    };
    let result = session.write(key.clone(), value.as_bytes().to_vec());
    let code = match result {
        Ok(()) => {
            println!("put {} -> {}", key, value);
            EXIT_SUCCESS
        }
        Err(e) => report(e),
    };
    let _ = session.close();
    code
}

fn cmd_sub(args: &ArgMatches) -> i32 {
    let config = build_config(args);
    let key = args.value_of("KEY").unwrap().to_string();

    let session = match zlite::open(&config) {
        Ok(s) => s,
        Err(e) => return report(e),
    };
    let declared = session.declare_subscriber(key.clone(), SubInfo::default(), |sample| {
        println!(">> [{}] {}", sample.res_name, String::from_utf8_lossy(&sample.payload));
    });
    let subscriber = match declared {
        Ok(s) => s,
        Err(e) => {
            let _ = session.close();
            return report(e);
        }
    };
    println!("Subscribed to {}, Ctrl-C to quit...", key);
    let reader = session.run();
    let _ = reader.join();
    let _ = subscriber;
    EXIT_SUCCESS
}

fn cmd_query(args: &ArgMatches) -> i32 {
    let config = build_config(args);
    let key = args.value_of("KEY").unwrap().to_string();
    let predicate = args.value_of("PREDICATE").unwrap_or("");

    let session = match zlite::open(&config) {
        Ok(s) => s,
        Err(e) => return report(e),
    };

    let query_args = QueryArgs {
        consolidation: zlite_core::core_types::QueryConsolidation {
            reception: ConsolidationMode::Full,
            ..zlite_core::core_types::QueryConsolidation::default()
        },
        ..QueryArgs::default()
    };
    let code = match session.query_collect(key, predicate, query_args) {
        Ok(replies) => {
            for reply in &replies {
                println!(">> [{}] {}", reply.data.res_name, String::from_utf8_lossy(&reply.data.payload));
            }
            println!("{} replies.", replies.len());
            EXIT_SUCCESS
        }
        Err(e) => report(e),
    };
    let _ = session.close();
    code
}

fn cmd_eval(args: &ArgMatches) -> i32 {
    let config = build_config(args);
    let key = args.value_of("KEY").unwrap().to_string();

    let session = match zlite::open(&config) {
        Ok(s) => s,
        Err(e) => return report(e),
    };
    let handler_key = key.clone();
    let declared = session.declare_queryable(key.clone(), zlite_core::core_types::queryable::ALL_KINDS, move |query| {
        let value = format!("Eval from {}: predicate='{}'", handler_key, query.predicate);
        println!(">> [Queryable ] answering '{}'", query.res_name);
        query.reply(zlite::Sample {
            res_name: query.res_name.clone(),
            payload: value.into_bytes(),
            kind: zlite_core::core_types::DataKind::Put,
            encoding: None,
            timestamp: None,
            source_id: None,
        });
    });
    let queryable = match declared {
        Ok(q) => q,
        Err(e) => {
            let _ = session.close();
            return report(e);
        }
    };
    println!("Declared queryable on {}, Ctrl-C to quit...", key);
    let reader = session.run();
    let _ = reader.join();
    let _ = queryable;
    EXIT_SUCCESS
}

fn report(err: ZError) -> i32 {
    eprintln!("error: {}", err);
    exit_code_for(&err)
}
