use std::path::PathBuf;

use clap::{Arg, ArgAction, ArgMatches, Command};
use contentspec::{ContentSpec, LinkOptions, NodeId, NodeKind};
use serde::Serialize;

use crate::commands::CommandResult;
use crate::context::CliSession;
use crate::error::CliError;

#[derive(Clone, Debug, Serialize)]
pub struct LinkEntry {
    pub kind: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<i32>,
    pub link_id: Option<String>,
}

pub fn command() -> Command {
    Command::new("links")
        .about("Show the anchor id generated for every level and topic")
        .arg(
            Arg::new("document")
                .value_name("DOCUMENT")
                .required(true)
                .value_parser(clap::value_parser!(PathBuf))
                .help("Path to the YAML outline document"),
        )
        .arg(
            Arg::new("fixed-urls")
                .long("fixed-urls")
                .action(ArgAction::SetTrue)
                .help("Derive anchors from titles and fixed URL properties instead of step numbers"),
        )
}

pub fn run(session: &CliSession, matches: &ArgMatches) -> Result<CommandResult, CliError> {
    let path = crate::util::required_path(matches, "document")?;
    let loaded = session.load_document(&path)?;
    let fixed_urls = matches.get_flag("fixed-urls");
    let options = loaded.link_options(fixed_urls);

    let mut links = Vec::new();
    collect_links(&loaded.spec, loaded.spec.base_level(), &options, &mut links);
    Ok(CommandResult::Links {
        path: loaded.path,
        fixed_urls,
        links,
    })
}

fn collect_links(spec: &ContentSpec, node: NodeId, options: &LinkOptions, out: &mut Vec<LinkEntry>) {
    let Some(entry) = spec.node(node) else {
        return;
    };
    let (kind, label) = match entry.kind() {
        NodeKind::Level(level) => (
            level.level_type().title().to_ascii_lowercase(),
            level.title().unwrap_or_default().to_string(),
        ),
        NodeKind::Topic(topic) => (
            "topic".to_string(),
            topic
                .title()
                .map(|title| format!("{title} [{}]", topic.id()))
                .unwrap_or_else(|| topic.id().to_string()),
        ),
        NodeKind::CommonContent(common) => ("common_content".to_string(), common.title().to_string()),
        _ => return,
    };
    if node != spec.base_level() {
        out.push(LinkEntry {
            kind,
            label,
            step: spec.step(node),
            link_id: spec.unique_link_id(node, options),
        });
    }

    if let Some(level) = spec.level(node) {
        for child in level.front_matter().iter().chain(level.child_nodes()) {
            collect_links(spec, *child, options, out);
        }
    }
}
