const DB_SCHEMA_VERSION: &str = "1.0.0";

mod date_resolve;
mod db_setup;
mod isin_normalize;
mod metadata;
mod record_parse;
mod run;
mod store_insert;
mod walk_and_stream;

pub use run::run;

use date_resolve::*;
use db_setup::*;
use isin_normalize::*;
use metadata::*;
use record_parse::*;
use store_insert::*;
use walk_and_stream::*;
