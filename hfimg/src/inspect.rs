//! The `inspect` subcommand: list container images, extract the primary.

use std::path::Path;

use heifconv::{CodecRegistry, FormatSet, Inspection, Inspector};
use serde::Serialize;

use crate::InspectArgs;
use crate::batch;

/// Run `inspect`; returns the number of failed files.
pub fn run(args: InspectArgs) -> anyhow::Result<usize> {
    let files = batch::expand_inputs(&args.files, FormatSet::CONTAINER_FAMILY)?;

    if files.is_empty() {
        anyhow::bail!("no image files found");
    }

    let registry = CodecRegistry::all();
    let inspector = Inspector::new(&registry).with_color_model(args.color.to_color_model());
    let multi = files.len() > 1;
    let mut failed = 0;

    for (i, path) in files.iter().enumerate() {
        if multi && !args.json {
            if i > 0 {
                println!();
            }
            println!("{}:", path.display());
        }

        let result = if args.no_extract {
            inspector.inspect(path)
        } else {
            inspector.inspect_and_extract_primary(path)
        };

        match result {
            Ok(inspection) => {
                let display = InspectionDisplay::new(path, &inspection);
                if args.json {
                    println!("{}", serde_json::to_string_pretty(&display)?);
                } else {
                    display.print();
                }
            }
            Err(e) => {
                failed += 1;
                eprintln!("  error: {e}");
            }
        }
    }

    Ok(failed)
}

#[derive(Debug, Serialize)]
struct InspectionDisplay {
    path: String,
    format: &'static str,
    mime_type: &'static str,
    image_count: usize,
    image_ids: Vec<u32>,
    primary: Option<PrimaryDisplay>,
    extracted_to: Option<String>,
}

#[derive(Debug, Serialize)]
struct PrimaryDisplay {
    id: u32,
    width: u32,
    height: u32,
}

impl InspectionDisplay {
    fn new(path: &Path, inspection: &Inspection) -> Self {
        Self {
            path: path.display().to_string(),
            format: inspection.format.name(),
            mime_type: inspection.format.mime_type(),
            image_count: inspection.image_ids.len(),
            image_ids: inspection.image_ids.clone(),
            primary: inspection.primary.map(|p| PrimaryDisplay {
                id: p.id,
                width: p.width,
                height: p.height,
            }),
            extracted_to: inspection.output.as_ref().map(|p| p.display().to_string()),
        }
    }

    fn print(&self) {
        println!("  Format:     {} ({})", self.format, self.mime_type);
        println!("  Images:     {} {:?}", self.image_count, self.image_ids);
        match self.primary {
            Some(ref p) => println!("  Primary:    #{} ({}x{})", p.id, p.width, p.height),
            None => println!("  Primary:    none"),
        }
        if let Some(ref out) = self.extracted_to {
            println!("  Extracted:  {out}");
        }
    }
}
