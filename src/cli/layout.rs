//! CLI `layout` command: run the simulation headless and print the result.

use anyhow::Result;
use clap::Args;

use memograph::config::MemographConfig;
use memograph::session::CategoryFilter;

#[derive(Args)]
pub struct LayoutArgs {
    /// Link rest length (clamped to the configured range)
    #[arg(long)]
    distance: Option<f64>,
    /// Only lay out notes in this category (id or name)
    #[arg(long)]
    category: Option<String>,
    /// Give up after this many ticks
    #[arg(long, default_value_t = 3000)]
    max_ticks: u64,
    #[arg(long)]
    width: Option<f64>,
    #[arg(long)]
    height: Option<f64>,
    /// Select a note so the output carries its emphasis partition
    #[arg(long)]
    select: Option<String>,
}

pub async fn layout(config: &MemographConfig, args: LayoutArgs) -> Result<()> {
    let engine = super::open_engine(config).await?;
    let filter = match &args.category {
        Some(wanted) => CategoryFilter::Only(super::resolve_category(&engine, wanted)?),
        None => CategoryFilter::All,
    };
    let selected = args
        .select
        .as_deref()
        .map(|id| super::resolve_note(&engine, id))
        .transpose()?;
    let frame = config.layout.tick_interval();

    let (ticks, graph) = engine.with_session(|s| {
        s.set_category_filter(filter);
        if let Some(distance) = args.distance {
            s.set_link_distance(distance);
        }
        if args.width.is_some() || args.height.is_some() {
            let width = args.width.unwrap_or(s.viewport().width());
            let height = args.height.unwrap_or(s.viewport().height());
            s.resize(width, height);
        }

        let mut ticks = 0;
        while ticks < args.max_ticks {
            ticks += 1;
            if s.tick(frame).is_idle() {
                break;
            }
        }

        s.fit_to_view();
        while s.tick(frame).animating {}

        if let Some(id) = &selected {
            s.on_node_click(id);
        }
        (ticks, s.visible_graph())
    });

    tracing::info!(ticks, nodes = graph.nodes.len(), "layout settled");
    println!("{}", serde_json::to_string_pretty(&graph)?);
    Ok(())
}
