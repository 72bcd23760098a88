//! SRT parsing/formatting shared by `SplitStep` and `SubtitleStep`, grounded
//! on `split_step.py`'s `_parse_srt`/`_parse_time_line` and
//! `subtitle_step.py`'s `_validate_srt_format`.

/// One cue parsed out of an SRT file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrtCue {
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
}

/// Parses an SRT file's contents into ordered cues. Malformed index lines
/// are skipped rather than failing the whole parse, matching
/// `_parse_srt`'s tolerant `try/except` around the index line.
pub fn parse_srt(content: &str) -> Vec<SrtCue> {
    let lines: Vec<&str> = content.lines().collect();
    let mut cues = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i].trim();
        if line.is_empty() {
            i += 1;
            continue;
        }
        if line.parse::<u32>().is_err() {
            i += 1;
            continue;
        }
        if i + 1 >= lines.len() {
            break;
        }
        let Some((start_ms, end_ms)) = parse_time_line(lines[i + 1].trim()) else {
            i += 1;
            continue;
        };

        let mut text = String::new();
        i += 2;
        while i < lines.len() && !lines[i].trim().is_empty() {
            text.push_str(lines[i].trim());
            i += 1;
        }

        cues.push(SrtCue { start_ms, end_ms, text });
        i += 1;
    }

    cues
}

fn parse_time_line(line: &str) -> Option<(u64, u64)> {
    let (start, end) = line.split_once("-->")?;
    Some((time_to_ms(start.trim())?, time_to_ms(end.trim())?))
}

fn time_to_ms(time: &str) -> Option<u64> {
    let (hms, ms) = time.split_once(',')?;
    let mut parts = hms.splitn(3, ':');
    let h: u64 = parts.next()?.parse().ok()?;
    let m: u64 = parts.next()?.parse().ok()?;
    let s: u64 = parts.next()?.parse().ok()?;
    let ms: u64 = ms.parse().ok()?;
    Some(h * 3_600_000 + m * 60_000 + s * 1000 + ms)
}

pub fn format_srt_time(total_ms: u64) -> String {
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    let s = total_secs % 60;
    let m = (total_secs / 60) % 60;
    let h = total_secs / 3600;
    format!("{h:02}:{m:02}:{s:02},{ms:03}")
}

pub fn write_srt(cues: &[SrtCue]) -> String {
    let mut out = String::new();
    for (i, cue) in cues.iter().enumerate() {
        out.push_str(&format!("{}\n", i + 1));
        out.push_str(&format!("{} --> {}\n", format_srt_time(cue.start_ms), format_srt_time(cue.end_ms)));
        out.push_str(&cue.text);
        out.push_str("\n\n");
    }
    out
}

/// Counts cue blocks the way `_validate_srt_format` does: the number of
/// blank-line separators between blocks.
pub fn count_subtitle_blocks(content: &str) -> usize {
    content.matches("\n\n").count()
}

/// Weighted text length used by `SplitStep`'s scene-budget check: a CJK
/// codepoint counts as 2 toward the character budget, everything else as 1.
pub fn weighted_len(text: &str) -> usize {
    text.chars().map(|c| if is_cjk(c) { 2 } else { 1 }).sum()
}

fn is_cjk(c: char) -> bool {
    matches!(c as u32,
        0x4E00..=0x9FFF |
        0x3400..=0x4DBF |
        0xF900..=0xFAFF |
        0x3000..=0x303F |
        0xFF00..=0xFFEF
    )
}

/// A deliberately small simplified-to-traditional lookup: the common
/// high-frequency characters that show up in TTS scripts. `opencc` isn't a
/// dependency this workspace carries (no pure-Rust binding in the pack), so
/// unmapped characters pass through unchanged rather than failing the step.
const S2T_TABLE: &[(char, char)] = &[
    ('简', '簡'), ('体', '體'), ('繁', '繁'), ('转', '轉'), ('换', '換'),
    ('中', '中'), ('文', '文'), ('国', '國'), ('语', '語'), ('汉', '漢'),
    ('为', '爲'), ('与', '與'), ('会', '會'), ('从', '從'), ('个', '個'),
    ('们', '們'), ('后', '後'), ('还', '還'), ('这', '這'), ('时', '時'),
    ('说', '說'), ('过', '過'), ('对', '對'), ('没', '沒'), ('现', '現'),
    ('样', '樣'), ('应', '應'), ('当', '當'), ('觉', '覺'), ('让', '讓'),
];

pub fn convert_to_traditional(text: &str) -> String {
    text.chars()
        .map(|c| S2T_TABLE.iter().find(|(s, _)| *s == c).map(|(_, t)| *t).unwrap_or(c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_cue() {
        let content = "1\n00:00:00,000 --> 00:00:02,500\nHello there\n\n";
        let cues = parse_srt(content);
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].start_ms, 0);
        assert_eq!(cues[0].end_ms, 2500);
        assert_eq!(cues[0].text, "Hello there");
    }

    #[test]
    fn roundtrips_through_write_srt() {
        let cues = vec![SrtCue { start_ms: 0, end_ms: 1000, text: "a".into() }, SrtCue { start_ms: 1000, end_ms: 2000, text: "b".into() }];
        let written = write_srt(&cues);
        let parsed = parse_srt(&written);
        assert_eq!(parsed, cues);
    }

    #[test]
    fn cjk_codepoints_count_double() {
        assert_eq!(weighted_len("ab"), 2);
        assert_eq!(weighted_len("中文"), 4);
        assert_eq!(weighted_len("a中"), 3);
    }

    #[test]
    fn traditional_conversion_is_partial_and_safe() {
        let converted = convert_to_traditional("简体中文测试");
        assert!(converted.starts_with("簡體中文"));
    }
}
