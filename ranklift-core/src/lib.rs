pub mod analysis;
pub mod data;
pub mod error;
pub mod report;

pub use data::Database;
pub use error::StoreError;

pub fn print_banner() {
    println!(
        r#"
                     _    _  _   __  _
    _ _  __ _  _ _  | |__| |(_) / _|| |_
   | '_|/ _` || ' \ | / /| || ||  _||  _|
   |_|  \__,_||_||_||_\_\|_||_||_|   \__|  v{}

   rank tracking & competitive signal analysis
"#,
        env!("CARGO_PKG_VERSION")
    );
}
