//! Dump tool: reads a font file and prints its table directory and
//! character-to-glyph mapping.

use std::{env, fs, process::ExitCode};

use atlas_type::{
    arena::Arena,
    font::Font,
    tables::cmap::{
        CmapSubtable, EncodingRecord, MacintoshEncodingId, PlatformId, UnicodeEncodingId,
        WindowsEncodingId,
    },
};

fn platform_specific_name(record: &EncodingRecord) -> String {
    let id = record.platform_specific_id();

    match record.platform_id() {
        PlatformId::Unicode => format!("{:?}", UnicodeEncodingId::from(id)),
        PlatformId::Macintosh => format!("{:?}", MacintoshEncodingId::from(id)),
        PlatformId::Microsoft => format!("{:?}", WindowsEncodingId::from(id)),
        _ => format!("{id}"),
    }
}

fn dump(font: &Font) {
    let directory = font.directory();
    println!("-- Table directory");
    println!("scaler type: {:?}", directory.scaler_type());
    for record in directory.records() {
        println!(
            "{} checksum: {:#010x} offset: {} length: {}",
            record.tag(),
            record.checksum(),
            record.offset(),
            record.length(),
        );
    }

    let Some(cmap) = font.cmap() else {
        println!("-- No codepoint map table");
        return;
    };

    println!("-- Codepoint map (version {})", cmap.version());
    for (i, record) in cmap.records().iter().enumerate() {
        println!(
            "{i}:\n  platform: {:?}\n  encoding: {}\n  offset: {}",
            record.platform_id(),
            platform_specific_name(record),
            record.offset(),
        );
    }

    match font.cmap_subtable() {
        Some(CmapSubtable::Format0(subtable)) => {
            let mapped = subtable
                .glyph_ids()
                .iter()
                .filter(|&&glyph| glyph != 0)
                .count();
            println!(
                "-- Format: 0\nlength: {}\nlanguage: {}\nmapped byte codes: {mapped}",
                subtable.length(),
                subtable.language(),
            );
        }
        Some(CmapSubtable::Format4(subtable)) => {
            println!(
                "-- Format: 4\nlength: {}\nlanguage: {}\nsegments: {}\nsearchRange: {}\nentrySelector: {}\nrangeShift: {}\nSegment ranges:",
                subtable.length(),
                subtable.language(),
                subtable.seg_count(),
                subtable.search_range(),
                subtable.entry_selector(),
                subtable.range_shift(),
            );
            for i in 0..usize::from(subtable.seg_count()) {
                println!(
                    "[{i}]: startCode: {:9} endCode: {:7} idDelta: {:7} idRangeOffset: {:12}",
                    subtable.start_codes()[i],
                    subtable.end_codes()[i],
                    subtable.id_deltas()[i],
                    subtable.id_range_offsets()[i],
                );
            }
        }
        None => println!("-- No decodable codepoint map subtable"),
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let Some(path) = env::args().nth(1) else {
        eprintln!("usage: atlas_type <font file>");
        return ExitCode::FAILURE;
    };

    let data = match fs::read(&path) {
        Ok(data) => data,
        Err(err) => {
            log::error!("failed to read {path}: {err}");
            return ExitCode::FAILURE;
        }
    };

    // The decoded directory and cmap arrays are a fraction of the file,
    // so the file size is a comfortable upper bound.
    let arena = Arena::with_capacity(data.len().max(4 * 1024));

    match Font::parse(&data, &arena) {
        Ok(font) => {
            dump(&font);
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("failed to parse {path}: {err}");
            ExitCode::FAILURE
        }
    }
}
