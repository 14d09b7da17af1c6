//! Layout version migration.

use lp_core::SpecId;
use lp_spec::PlotSpecDict;

use crate::LayoutError;
use crate::schema::PlotLayoutDef;

pub const LATEST_VERSION: u32 = 1;

pub fn migrate_to_latest(mut layout: PlotLayoutDef) -> Result<PlotLayoutDef, LayoutError> {
    while layout.version < LATEST_VERSION {
        layout = migrate_one_version(layout)?;
    }
    Ok(layout)
}

fn migrate_one_version(layout: PlotLayoutDef) -> Result<PlotLayoutDef, LayoutError> {
    match layout.version {
        0 => migrate_v0_to_v1(layout),
        v => Err(LayoutError::Migration {
            what: format!("No migration path from version {}", v),
        }),
    }
}

/// Unversioned layouts may lack `unique_id`s; give every such node a
/// fresh one so it can be reproduced.
fn migrate_v0_to_v1(mut layout: PlotLayoutDef) -> Result<PlotLayoutDef, LayoutError> {
    fn assign_ids(dict: &mut PlotSpecDict) {
        let blank = dict
            .unique_id
            .as_deref()
            .is_none_or(|id| id.trim().is_empty());
        if blank {
            dict.unique_id = Some(SpecId::generate().as_str().to_string());
        }
        dict.input_plot_specs.iter_mut().for_each(assign_ids);
    }

    for tab in &mut layout.tabs {
        for subplot in &mut tab.subplots {
            for trace in &mut subplot.traces {
                assign_ids(&mut trace.plot_spec);
            }
        }
    }
    layout.version = 1;
    Ok(layout)
}
