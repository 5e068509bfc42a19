//! Console output helpers.

use owo_colors::OwoColorize;

const LOGO: &str = r"
    _________            .___       __________          .___  .___
    \_   ___ \  ____   __| _/____   \______   \__ __  __| _/__| _/__.__.
    /    \  \/ /  _ \ / __ |/ __ \   |    |  _/  |  \/ __ |/ __ <   |  |
    \     \___(  <_> ) /_/ \  ___/   |    |   \  |  / /_/ / /_/ |\___  |
     \______  /\____/\____ |\___  >  |______  /____/\____ \____ |/ ____|
            \/            \/    \/          \/           \/    \/\/
";

const TAGLINE: &str = "       Your personal Git assistant";

const COMPACT_LOGO: &str = "🚀 code_buddy — automate your GitHub workflows";

/// Width of the rule printed around confirmation details.
const RULE_WIDTH: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderMode {
    #[default]
    Banner,
    Compact,
}

/// Print the logo followed by a command title.
pub fn print_header(title: &str, mode: HeaderMode) {
    match mode {
        HeaderMode::Banner => {
            println!("{}", LOGO.cyan());
            println!("{}", TAGLINE.bright_magenta());
        }
        HeaderMode::Compact => println!("{}", COMPACT_LOGO.bright_magenta()),
    }
    if !title.is_empty() {
        println!("\n{}\n", title.blue().bold());
    }
}

pub fn step(msg: &str) {
    println!("{}", msg.blue());
}

pub fn success(msg: &str) {
    println!("{}", msg.green());
}

pub fn warn(msg: &str) {
    println!("{}", msg.yellow());
}

pub fn failure(msg: &str) {
    eprintln!("{}", msg.red());
}

pub fn muted(msg: &str) {
    println!("{}", msg.dimmed());
}

/// Print a titled block of details between two rules.
pub fn detail_block(title: &str, details: &[String]) {
    let rule = "─".repeat(RULE_WIDTH);
    println!("\n{}", title.blue().bold());
    println!("{}", rule.dimmed());
    for detail in details {
        println!("{}", detail);
    }
    println!("{}", rule.dimmed());
}

/// "✅" or "❌" for a config flag.
pub fn tick(enabled: bool) -> &'static str {
    if enabled {
        "✅"
    } else {
        "❌"
    }
}
