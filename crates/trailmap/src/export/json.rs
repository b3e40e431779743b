//! JSON export backend.

use std::io::Write;

use log::debug;

use trailmap_core::event::Event;

use crate::{
    export::{self, Exporter},
    layout::Layout,
};

/// Writes a [`Layout`] as pretty-printed JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct Json;

impl Exporter for Json {
    fn export_layout(
        &self,
        layout: &Layout,
        _events: &[Event],
        writer: &mut dyn Write,
    ) -> Result<(), export::Error> {
        serde_json::to_writer_pretty(&mut *writer, layout).map_err(|err| {
            if err.is_io() {
                export::Error::Io(err.into())
            } else {
                export::Error::Render(err.to_string())
            }
        })?;
        writeln!(writer).map_err(export::Error::Io)?;

        debug!(nodes_count = layout.nodes().len(); "Layout JSON written");
        Ok(())
    }
}
