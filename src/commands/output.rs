/// Format a titled list of packages:
///
/// ```text
///
/// Shared
/// =======
/// @acme/ui
/// @acme/core
///
/// ```
pub fn format_block<S: AsRef<str>>(heading: &str, items: &[S]) -> String {
    let lines: Vec<&str> = items.iter().map(|s| s.as_ref()).collect();
    format!("\n{}\n=======\n{}\n", heading, lines.join("\n"))
}

pub(crate) fn print_block<S: AsRef<str>>(heading: &str, items: &[S]) {
    println!("{}", format_block(heading, items));
}
