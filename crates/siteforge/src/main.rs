// Target-specific transitive dependency split (crossterm stack under the pager) is accepted for now.
#![allow(clippy::multiple_crate_versions)]

fn main() {
    match siteforge_cli::run() {
        Ok(code) => std::process::exit(code),
        Err(error) => {
            eprintln!("error: {error:#}");
            std::process::exit(1);
        }
    }
}
