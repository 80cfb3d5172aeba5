use std::fs;

const SECTIONS: [&str; 4] = ["page", "links", "index", "output"];

fn main() {
    // The built-in config is embedded with include_str!, so reject a broken
    // one here rather than silently falling back to defaults at runtime.
    let config_path = "src/default_config.toml";
    println!("cargo:rerun-if-changed={config_path}");

    let content = fs::read_to_string(config_path)
        .unwrap_or_else(|e| panic!("cannot read {config_path}: {e}"));

    let table = match content.parse::<toml::Table>() {
        Ok(table) => table,
        Err(e) => panic!("invalid {config_path}: {e}"),
    };

    for section in SECTIONS {
        if !table.get(section).is_some_and(toml::Value::is_table) {
            panic!("{config_path} is missing the [{section}] table");
        }
    }
}
