//! sc-inspect: print the structure of a saved canvas.
//!
//! Usage: `sc-inspect [FILE]` (reads stdin when FILE is omitted or `-`).
//! Accepts the frontend wire shape or the server's stored shape. Log
//! verbosity follows `RUST_LOG`.

use sc_core::{
    GroupKey, Restored, StoredProject, WireError, WireProject, classify, deserialize, group_bounds,
};
use std::io::Read;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();

    let path = std::env::args().nth(1);
    if matches!(path.as_deref(), Some("-h" | "--help")) {
        println!("Usage: sc-inspect [FILE]\n\nPrint groups, version chains and bounds of a saved canvas.");
        return ExitCode::SUCCESS;
    }

    let text = match read_input(path.as_deref()) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("sc-inspect: {err}");
            return ExitCode::FAILURE;
        }
    };

    match parse_project(&text) {
        Ok(project) => {
            print!("{}", describe(&deserialize(&project)));
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("sc-inspect: {err}");
            ExitCode::FAILURE
        }
    }
}

fn read_input(path: Option<&str>) -> std::io::Result<String> {
    match path {
        None | Some("-") => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
        Some(path) => std::fs::read_to_string(path),
    }
}

/// Try the frontend shape first, then the stored shape.
fn parse_project(text: &str) -> Result<WireProject, WireError> {
    match WireProject::from_json(text) {
        Ok(project) => Ok(project),
        Err(wire_err) => match StoredProject::from_json(text) {
            Ok(stored) => {
                log::debug!("input is in stored shape");
                Ok(stored.into())
            }
            Err(_) => Err(wire_err),
        },
    }
}

fn describe(restored: &Restored) -> String {
    let grouping = classify(&restored.screens);
    let bounds = group_bounds(&grouping, &restored.sizes);
    let mut out = String::new();

    for (group, (_, rect)) in grouping.groups.iter().zip(&bounds) {
        let key = group.key.to_string();
        let name = restored
            .group_names
            .get(&key)
            .map(String::as_str)
            .unwrap_or(group.key.kind().default_name());
        out.push_str(&format!(
            "{key} \"{name}\" [{:.0},{:.0} {:.0}x{:.0}]\n",
            rect.x, rect.y, rect.width, rect.height
        ));
        for screen in &group.members {
            let size = screen.effective_size(&restored.sizes);
            let page = screen
                .page_name
                .as_deref()
                .map(|p| format!(" page={p}"))
                .unwrap_or_default();
            out.push_str(&format!(
                "  {} \"{}\" v{} @({:.0},{:.0}) {:.0}x{:.0}{page}\n",
                screen.id,
                screen.title,
                screen.title.ordinal(),
                screen.position.x,
                screen.position.y,
                size.width,
                size.height
            ));
        }
        if let GroupKey::Versions(base) = &group.key {
            out.push_str(&format!("  chain of {base}: {} versions\n", group.members.len()));
        }
    }

    for screen in &grouping.ungrouped {
        out.push_str(&format!(
            "single {} \"{}\" @({:.0},{:.0})\n",
            screen.id, screen.title, screen.position.x, screen.position.y
        ));
    }
    out
}
