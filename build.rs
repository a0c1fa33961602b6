use grep::regex::RegexMatcher;
use grep::searcher::{Searcher, Sink, SinkMatch};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use walkdir::WalkDir;

// Source trees held to the project's hygiene rules.
const SCANNED_DIRS: [&str; 4] = ["serve", "cli", "tests", "benches"];

const FORBIDDEN_WORDS: [&str; 14] = [
    "FIXED",
    "CORRECTED",
    "FIX",
    "FIXES",
    "NEW",
    "CHANGED",
    "CHANGES",
    "CHANGE",
    "MODIFIED",
    "MODIFIES",
    "MODIFY",
    "UPDATED",
    "UPDATES",
    "UPDATE",
];

#[derive(Clone, Copy)]
enum Rule {
    UnderscorePrefix,
    AllowDeadCode,
    ForbiddenCommentWord,
    StarsInComment,
    AllCapsComment,
}

impl Rule {
    const ALL: [Rule; 5] = [
        Rule::UnderscorePrefix,
        Rule::AllowDeadCode,
        Rule::ForbiddenCommentWord,
        Rule::StarsInComment,
        Rule::AllCapsComment,
    ];

    fn pattern(self) -> String {
        match self {
            Rule::UnderscorePrefix => r"\b(_[a-zA-Z0-9_]+)\b".to_string(),
            Rule::AllowDeadCode => r"#\s*\[\s*allow\s*\(\s*dead_code\s*\)\s*\]".to_string(),
            Rule::ForbiddenCommentWord => {
                format!(r"(//|/\*).*(?:{})", FORBIDDEN_WORDS.join("|"))
            }
            Rule::StarsInComment => r"(//|/\*).*\*\*".to_string(),
            Rule::AllCapsComment => r"(//|/\*).*".to_string(),
        }
    }

    fn summary(self) -> &'static str {
        match self {
            Rule::UnderscorePrefix => "underscore-prefixed identifiers",
            Rule::AllowDeadCode => "#[allow(dead_code)] attributes",
            Rule::ForbiddenCommentWord => "comments with forbidden words",
            Rule::StarsInComment => "'**' in non-doc comments",
            Rule::AllCapsComment => "all-uppercase comments",
        }
    }

    fn advice(self) -> String {
        match self {
            Rule::UnderscorePrefix => {
                "Either use the binding (removing the underscore) or remove it completely."
                    .to_string()
            }
            Rule::AllowDeadCode => {
                "Either use the code (removing the attribute) or remove it completely.".to_string()
            }
            Rule::ForbiddenCommentWord => format!(
                "Comments containing {} are not allowed. Remove them completely.",
                FORBIDDEN_WORDS.join(", ")
            ),
            Rule::StarsInComment => {
                "The '**' pattern is only allowed in doc comments.".to_string()
            }
            Rule::AllCapsComment => "Consider deleting the comment completely.".to_string(),
        }
    }

    /// Decides whether a line the matcher hit is a real violation.
    fn is_violation(self, line: &str) -> bool {
        match self {
            Rule::UnderscorePrefix => !is_comment(line) && !underscore_only_in_strings(line),
            Rule::AllowDeadCode | Rule::ForbiddenCommentWord => true,
            Rule::StarsInComment => !is_doc_comment(line),
            Rule::AllCapsComment => comment_text(line).is_some_and(|text| {
                let mut letters = text.chars().filter(|c| c.is_alphabetic()).peekable();
                letters.peek().is_some() && letters.all(|c| c.is_uppercase())
            }),
        }
    }
}

struct RuleCollector {
    rule: Rule,
    violations: Vec<String>,
}

impl Sink for RuleCollector {
    type Error = std::io::Error;

    fn matched(&mut self, _: &Searcher, mat: &SinkMatch) -> Result<bool, Self::Error> {
        let line_number = mat.line_number().unwrap_or(0);
        let line_text = std::str::from_utf8(mat.bytes()).unwrap_or("").trim_end();
        if self.rule.is_violation(line_text) {
            self.violations.push(format!("{line_number}:{line_text}"));
        }
        Ok(true)
    }
}

fn is_comment(line: &str) -> bool {
    line.trim_start().starts_with("//") || line.contains("/*")
}

fn is_doc_comment(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("///") || trimmed.starts_with("//!")
}

fn underscore_only_in_strings(line: &str) -> bool {
    line.split('"')
        .enumerate()
        .any(|(i, part)| i % 2 == 1 && part.contains('_'))
}

fn comment_text(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    if let Some(rest) = trimmed
        .strip_prefix("///")
        .or_else(|| trimmed.strip_prefix("//!"))
        .or_else(|| trimmed.strip_prefix("//"))
    {
        return Some(rest.trim());
    }
    let start = line.find("/*")? + 2;
    let body = &line[start..];
    Some(match body.find("*/") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    })
}

fn rust_sources() -> Vec<PathBuf> {
    SCANNED_DIRS
        .iter()
        .filter(|dir| Path::new(dir).is_dir())
        .flat_map(|dir| WalkDir::new(dir).into_iter().filter_map(|e| e.ok()))
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "rs"))
        .map(|e| e.into_path())
        .collect()
}

fn scan(rule: Rule, files: &[PathBuf]) -> Result<(), Box<dyn Error>> {
    let matcher = RegexMatcher::new_line_matcher(&rule.pattern())?;
    let mut searcher = Searcher::new();

    for path in files {
        let mut collector = RuleCollector {
            rule,
            violations: Vec::new(),
        };
        searcher.search_path(&matcher, path, &mut collector)?;

        if !collector.violations.is_empty() {
            let mut message = format!(
                "\n❌ ERROR: Found {} {} in {}:\n",
                collector.violations.len(),
                rule.summary(),
                path.display()
            );
            for violation in &collector.violations {
                message.push_str(&format!("   {violation}\n"));
            }
            message.push_str(&format!("\n⚠️ {}\n", rule.advice()));
            return Err(message.into());
        }
    }
    Ok(())
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    for dir in SCANNED_DIRS {
        println!("cargo:rerun-if-changed={dir}");
    }

    let build_timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    println!("cargo:rustc-env=DAYCAST_BUILD_TIMESTAMP={build_timestamp}");

    let files = rust_sources();
    for rule in Rule::ALL {
        if let Err(e) = scan(rule, &files) {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
