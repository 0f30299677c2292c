use anyhow::bail;

pub type CliResult<T> = anyhow::Result<T>;

/// Splits a `--namespace prefix=uri` / `--var name=value` argument.
pub fn parse_binding(value: &str, option: &str) -> CliResult<(String, String)> {
    let Some((name, bound)) = value.split_once('=') else {
        bail!("--{option} expects NAME=VALUE, got `{value}`");
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("--{option} has an empty name in `{value}`");
    }
    Ok((name.to_owned(), bound.to_owned()))
}

pub fn parse_bindings(values: &[String], option: &str) -> CliResult<Vec<(String, String)>> {
    values.iter().map(|value| parse_binding(value, option)).collect()
}
