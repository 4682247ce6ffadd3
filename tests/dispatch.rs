// SPDX-License-Identifier: LGPL-2.1
//! End-to-end dispatcher runs over real files on disk.

use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use powdler::{DataKind, DecodeError, RasterLoader, decode_bank, scan_banks};

fn workdir(name: &str) -> Result<PathBuf> {
  let _ = env_logger::builder().is_test(true).try_init();
  let dir = std::env::temp_dir().join(format!("powdler-test-{}-{}", std::process::id(), name));
  fs::create_dir_all(&dir)?;
  Ok(dir)
}

fn build_adsc(size: usize) -> Vec<u8> {
  let mut text = String::from("{\nHEADER_BYTES=  512;\n");
  text.push_str(&format!("SIZE1={};\n", size));
  text.push_str("BIN=2x2;\nWAVELENGTH=1.03320;\nDISTANCE=180.00;\nCENTER_X=105.20;\nCENTER_Y=104.70;\n}\n\n");
  let mut buf = text.into_bytes();
  buf.resize(512, b' ');
  for i in 0..size * size {
    buf.extend_from_slice(&(i as u16).to_le_bytes());
  }
  buf
}

fn build_edf(rows: usize, cols: usize) -> Vec<u8> {
  let mut text = String::from("{\n");
  text.push_str(&format!("Dim_1 = {} ;\nDim_2 = {} ;\n", cols, rows));
  text.push_str(&format!("Size = {} ;\n", rows * cols * 2));
  text.push_str("DataType = UnsignedShort ;\nByteOrder = LowByteFirst ;\n}\n");
  let mut buf = text.into_bytes();
  buf.resize(3072, b' ');
  for i in 0..rows * cols {
    buf.extend_from_slice(&(i as u16).to_le_bytes());
  }
  buf
}

#[test]
fn routes_by_extension() -> Result<()> {
  let dir = workdir("ext")?;
  let path = dir.join("frame.img");
  fs::write(&path, build_adsc(4))?;

  let image = RasterLoader::new().decode_file(&path)?;
  assert_eq!(image.detector, "ADSC");
  assert_eq!(image.meta.size, (4, 4));
  assert_eq!(image.meta.pixel_size, (102.0, 102.0));
  Ok(())
}

#[test]
fn misnamed_file_falls_back_to_content_probe() -> Result<()> {
  // EDF bytes behind a .tif name: the TIFF decoder declines, the probe
  // re-routes, and the decode still succeeds.
  let dir = workdir("probe")?;
  let path = dir.join("mislabeled.tif");
  fs::write(&path, build_edf(2, 2))?;

  let image = RasterLoader::new().decode_file(&path)?;
  assert_eq!(image.detector, "EDF");
  assert_eq!(image.meta.size, (2, 2));
  Ok(())
}

#[test]
fn unknown_extension_and_content_is_unsupported() -> Result<()> {
  let dir = workdir("unknown")?;
  let path = dir.join("notes.xyz");
  fs::write(&path, b"just some text\n")?;

  match RasterLoader::new().decode_file(&path) {
    Err(DecodeError::UnsupportedFile(_)) => Ok(()),
    other => anyhow::bail!("expected UnsupportedFile, got {:?}", other.map(|i| i.detector)),
  }
}

#[test]
fn powder_file_scans_and_decodes_from_disk() -> Result<()> {
  let dir = workdir("powder")?;
  let path = dir.join("scan.gsa");
  fs::write(
    &path,
    "# test pattern\nBANK 1 2 1 CONS 200 5 0 0 FXYE\n100.0 4.0 2.0\n200.0 9.0 3.0\n",
  )?;

  let scan = scan_banks(&path)?;
  assert_eq!(scan.banks.len(), 1);
  let profile = decode_bank(&scan.banks[0], DataKind::ConstantWavelength)?;
  assert_eq!(profile.len(), 2);
  assert_eq!(profile.x, vec![1.0, 2.0]);
  assert_eq!(profile.w, vec![0.25, 1.0 / 9.0]);
  Ok(())
}
