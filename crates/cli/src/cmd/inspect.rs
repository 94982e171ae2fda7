//! Implementation of the `forge inspect-image` command.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use forge_lib::pe;

use crate::output::{OutputFormat, format_bytes, print_info, print_json, print_stat, print_success, print_warning};

#[derive(Serialize)]
struct InspectOutput {
  size: usize,
  machine: Option<String>,
  is_64bit: bool,
}

pub fn cmd_inspect_image(file: &Path, format: OutputFormat) -> Result<()> {
  let image = std::fs::read(file).with_context(|| format!("Failed to read image: {}", file.display()))?;
  let machine = pe::machine_type(&image);
  let is_64bit = pe::is_64bit_image(&image);

  if format.is_json() {
    return print_json(&InspectOutput {
      size: image.len(),
      machine: machine.map(|m| m.name()),
      is_64bit,
    });
  }

  match machine {
    Some(machine) => {
      print_success(&format!("{}: PE image", file.display()));
      print_stat("Machine", &machine.name());
    }
    None => print_warning(&format!("{}: no readable PE header", file.display())),
  }
  print_stat("Size", &format_bytes(image.len() as u64));
  print_info(if is_64bit { "64-bit image" } else { "not a 64-bit image" });

  Ok(())
}
