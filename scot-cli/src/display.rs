//! Human-readable output: chunk tables, metadata summaries, hex dumps

use chrono::Weekday;
use scot_core::flags::Flag;
use scot_core::{
    AudioMetadata, ChunkDescriptor, ChunkIndex, Dayparting, ExtendedFlag, PackedDate, PrimaryFlag,
};

fn yes_no(value: bool) -> &'static str {
    if value { "Yes" } else { "No" }
}

pub fn print_index(index: &ChunkIndex) {
    println!("{:<15} | {:<6} | {:<10}", "Offset (Hex)", "ID", "Size");
    println!("{}", "-".repeat(35));
    for chunk in index.iter() {
        println!(
            "0x{:08X}      | {:<6} | {}",
            chunk.offset,
            chunk.tag.to_string(),
            chunk.length
        );
    }
}

fn printable(b: u8) -> char {
    match b {
        b' ' => ' ',
        b if b.is_ascii_graphic() => b as char,
        _ => '.',
    }
}

/// Printable-ASCII rendering of a payload, `width` bytes per line
pub fn dump_lines(data: &[u8], width: usize) -> Vec<String> {
    let width = width.max(1);
    data.chunks(width)
        .enumerate()
        .map(|(i, line)| {
            let text: String = line.iter().map(|&b| printable(b)).collect();
            format!("{:03X}    | {}", i * width, text)
        })
        .collect()
}

pub fn print_dump(chunk: &ChunkDescriptor, data: &[u8], width: usize) {
    println!(
        "\n>>> CHUNK: {} | OFFSET: 0x{:08X} | SIZE: {} bytes <<<",
        chunk.tag, chunk.offset, chunk.length
    );
    println!("{:<6} | Content", "Offset");
    println!("{}", "-".repeat(45));
    for line in dump_lines(data, width) {
        println!("{}", line);
    }
}

const DAYS: [(Weekday, char); 7] = [
    (Weekday::Sun, 'U'),
    (Weekday::Mon, 'M'),
    (Weekday::Tue, 'T'),
    (Weekday::Wed, 'W'),
    (Weekday::Thu, 'R'),
    (Weekday::Fri, 'F'),
    (Weekday::Sat, 'S'),
];

/// One row per day, hours 00-23 split into two half-days
pub fn dayparting_lines(schedule: &Dayparting) -> Vec<String> {
    let mut lines = vec![
        "  00                     23".to_string(),
        "  |           |           |".to_string(),
        "-".repeat(27),
    ];
    for (day, letter) in DAYS {
        let mut row = String::with_capacity(27);
        row.push(letter);
        for hour in 0..24u8 {
            if hour % 12 == 0 {
                row.push(' ');
            }
            row.push(char::from(b'0' + schedule.is_allowed(day, hour) as u8));
        }
        lines.push(row);
    }
    lines
}

fn describe_date(date: &PackedDate) -> String {
    match date {
        PackedDate::EpochStart => "open start".to_string(),
        PackedDate::FarFuture => "no end".to_string(),
        PackedDate::At(instant) => instant.format("%Y-%m-%d %H:00").to_string(),
    }
}

pub fn print_metadata(meta: &AudioMetadata) {
    let primary = &meta.primary_flags;
    let has = |flag| yes_no(primary.contains(flag));
    let length_format = if primary.contains(PrimaryFlag::LengthHmmss) {
        "HMMSS"
    } else {
        "MM:SS"
    };
    let length_type = if primary.contains(PrimaryFlag::LengthUntilEom) {
        "Until EOM"
    } else {
        "Until EOF"
    };

    println!();
    println!("File Flags:");
    for (label, value) in [
        ("Extended Flags Enabled:", has(PrimaryFlag::ExtendedFlagsEnabled)),
        ("Is a Rotation Look Up Table:", has(PrimaryFlag::RotationLookupTable)),
        ("Is a Voice Track:", has(PrimaryFlag::VoiceTrack)),
        ("Length Format:", length_format),
        ("Length Type:", length_type),
        ("Parent of Rotation Set:", has(PrimaryFlag::ParentOfRotationSet)),
    ] {
        println!("{:<32}{}", label, value);
    }

    if primary.contains(PrimaryFlag::ExtendedFlagsEnabled) {
        println!();
        println!("Extended Flags:");
        for flag in ExtendedFlag::ALL {
            println!("{:<32}{}", format!("{:?}:", flag), yes_no(meta.extended_flag(*flag)));
        }
    }

    if meta.extended_flag(ExtendedFlag::DaypartingEnabled) {
        println!();
        println!("Dayparting Table:");
        for line in dayparting_lines(&meta.dayparting) {
            println!("{}", line);
        }
    }

    let length = match meta.length() {
        Ok(length) => format!("{:02}:{:02}", length.num_minutes(), length.num_seconds() % 60),
        Err(e) => format!("unreadable ({})", e),
    };
    let start = meta.start_time.as_duration();
    let end = meta.end_time.as_duration();

    println!();
    println!("Title:          {}", meta.title);
    println!("Artist:         {}", meta.artist);
    println!("Album:          {}", meta.album);
    println!("Year:           {}", meta.release_date.format("%Y"));
    println!("Cart:           {}", meta.cart_number);
    println!("Length:         {}", length);
    println!(
        "Time:           {:.2}s to {:.2}s",
        start.num_milliseconds() as f64 / 1000.0,
        end.num_milliseconds() as f64 / 1000.0
    );
    println!(
        "Dates:          {} to {}",
        describe_date(&meta.start_date),
        describe_date(&meta.end_date)
    );
    println!("Audio Type:     {}", meta.audio_type);
    println!("Sample Rate:    {} Hz", meta.sample_rate);
    println!("Stereo/Mono:    {}", meta.stereo_mono);
    println!("Compression:    {}", meta.compression_type);
    println!("EOM Start:      {} seconds", meta.eom_start_tenths as f64 / 10.0);
    println!("EOM Length:     {} seconds", meta.eom_length_hundredths as f64 / 100.0);
    println!("Hook Start:     {} seconds", meta.hook_start_ms as f64 / 1000.0);
    println!("Hook EOM:       {} seconds", meta.hook_eom_ms as f64 / 1000.0);
    println!("Hook End:       {} seconds", meta.hook_end_ms as f64 / 1000.0);
    let [r, g, b, a] = meta.font_color;
    println!("Font Color:     RGBA({}, {}, {}, {})", r, g, b, a);
    let [r, g, b, a] = meta.background_color;
    println!("BG Color:       RGBA({}, {}, {}, {})", r, g, b, a);
    println!(
        "VT Start Time:  {}.{:02} seconds",
        meta.vt_start.seconds, meta.vt_start.hundredths
    );
    println!("Before Link:    {}/{}", meta.before_link.category, meta.before_link.cart);
    println!("After Link:     {}/{}", meta.after_link.category, meta.after_link.cart);
    println!("Intro Time:     {} seconds", meta.intro_seconds);
    println!("End Type:       {}", meta.end_type);
    println!("Imported:       {}", describe_date(&meta.import_date));
    println!("MPEG Bitrate:   {} kbps", meta.mpeg_bitrate);
    println!("Playback Speed: {}%", meta.playback_speed as f64 / 100.0);
    for (i, trigger) in meta.triggers.iter().enumerate().filter(|(_, t)| t.0 != 0) {
        println!(
            "Trigger {}:      source {} at {:.1}s",
            i + 1,
            trigger.source_id(),
            trigger.offset_tenths() as f64 / 10.0
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dump_lines() {
        let lines = dump_lines(b"scot\0\x01ABC", 4);
        assert_eq!(lines, vec!["000    | scot", "004    | ..AB", "008    | C"]);

        assert_eq!(dump_lines(b"a b\x7f\xe9", 8), vec!["000    | a b.."]);
    }

    #[test]
    fn test_dayparting_lines() {
        let mut schedule = Dayparting::none();
        schedule.set(Weekday::Mon, 0, true);
        schedule.set(Weekday::Mon, 23, true);

        let lines = dayparting_lines(&schedule);
        assert_eq!(lines.len(), 3 + 7);
        assert_eq!(lines[3], format!("U {} {}", "0".repeat(12), "0".repeat(12)));
        assert_eq!(lines[4], format!("M 1{} {}1", "0".repeat(11), "0".repeat(11)));
        assert_eq!(lines[4].len(), 27);
    }
}
