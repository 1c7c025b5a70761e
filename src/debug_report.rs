use sprengine::{CompileResultVerbose, PassTrace};

mod ansi {
    /// What a piece of report text is, rather than how it looks.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum Style {
        Title,
        Section,
        Muted,
        Good,
        Result,
        Warn,
        Label,
        Pass,
    }

    impl Style {
        fn sgr(self) -> &'static str {
            match self {
                Style::Title => "1;36",
                Style::Section => "90",
                Style::Muted => "2",
                Style::Good => "32",
                Style::Result => "1;32",
                Style::Warn => "33",
                Style::Label => "34",
                Style::Pass => "36",
            }
        }
    }

    #[derive(Clone, Copy)]
    pub struct Palette(pub bool);

    impl Palette {
        pub fn paint(self, s: impl AsRef<str>, style: Style) -> String {
            let s = s.as_ref();
            if self.0 { format!("\x1b[{}m{s}\x1b[0m", style.sgr()) } else { s.to_string() }
        }

        pub fn section(self, name: &str) -> String {
            self.paint(format!("━━━ {name} ━━━"), Style::Section)
        }
    }
}

use ansi::{Palette, Style};

pub fn print_run(input: &str, result: &CompileResultVerbose, store_modified: bool, color: bool) {
    let palette = Palette(color);
    let details = &result.details;
    println!("\n{}", palette.paint(format!("⚙  Compiling: \"{input}\""), Style::Title));

    println!("\n{}", palette.section("Passes"));
    if details.passes.is_empty() {
        println!("{}", palette.paint("  No passes ran (nothing that could be a placeholder)", Style::Muted));
    } else {
        print_passes(&details.passes, palette);
    }

    if !details.references.is_empty() {
        println!("\n{}", palette.section("References"));
        for (token, value) in &details.references {
            println!("  {} {} {}", palette.paint(token, Style::Label), palette.paint("→", Style::Muted), palette.paint(value, Style::Good));
        }
    }

    if details.recursion_limit_hit || store_modified {
        println!("\n{}", palette.section("Notes"));
        if details.recursion_limit_hit {
            println!("  {}", palette.paint("• Recursion limit hit; a branch compiled to \"\"", Style::Warn));
            println!("  {}", palette.paint("  (usually a field that refers to itself)", Style::Muted));
        }
        if store_modified {
            println!("  {}", palette.paint("• Record was modified ({HMACOTP} / {NEWPASSWORD})", Style::Warn));
        }
    }

    println!("\n{}", palette.section("Result"));
    println!("  {}", palette.paint(&result.text, Style::Result));

    println!("\n{}", palette.section("Timing"));
    let changed = details.passes.iter().filter(|p| p.changed).count();
    println!(
        "  Total: {}  │  Passes: {}  │  Changed: {}",
        palette.paint(format!("{:?}", details.total), Style::Good),
        palette.paint(details.passes.len().to_string(), Style::Pass),
        palette.paint(changed.to_string(), Style::Muted),
    );
    println!();
}

fn print_passes(passes: &[PassTrace], palette: Palette) {
    let max_depth = passes.iter().map(|p| p.depth).max().unwrap_or(0);
    for depth in 0..=max_depth {
        let at_depth: Vec<&PassTrace> = passes.iter().filter(|p| p.depth == depth).collect();
        if at_depth.is_empty() {
            continue;
        }
        let changed: Vec<&&PassTrace> = at_depth.iter().filter(|p| p.changed).collect();

        println!(
            "  {} {}",
            palette.paint(format!("Depth {depth}:"), Style::Label),
            if changed.is_empty() {
                palette.paint(format!("✗ {} passes, no change", at_depth.len()), Style::Muted)
            } else {
                palette.paint(format!("✓ {} of {} passes changed the text", changed.len(), at_depth.len()), Style::Good)
            }
        );

        for pass in changed.iter().take(8) {
            println!("    {} {}", palette.paint(pass.pass, Style::Pass), palette.paint(format!("{:?}", pass.duration), Style::Muted));
        }
        if changed.len() > 8 {
            println!("    {}", palette.paint(format!("... +{} more", changed.len() - 8), Style::Muted));
        }
    }
}
