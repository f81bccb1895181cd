//! Resume → PDF. Single-column A4 layout in the built-in Helvetica faces, so
//! no font files are embedded.

use anyhow::{Context, Result};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use crate::models::ResumeRecord;

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 56.0;
/// Average Helvetica glyph width as a fraction of the font size.
const AVG_GLYPH_WIDTH: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Style {
    Title,
    Heading,
    Body,
    Bullet,
}

impl Style {
    fn font(&self) -> &'static str {
        match self {
            Style::Title | Style::Heading => "F2",
            Style::Body | Style::Bullet => "F1",
        }
    }

    fn size(&self) -> f32 {
        match self {
            Style::Title => 20.0,
            Style::Heading => 13.0,
            Style::Body | Style::Bullet => 10.5,
        }
    }

    fn indent(&self) -> f32 {
        match self {
            Style::Bullet => 14.0,
            _ => 0.0,
        }
    }

    fn leading(&self) -> f32 {
        self.size() * 1.35
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Line {
    style: Style,
    text: String,
    /// Extra space above the line, in points.
    space_before: f32,
}

/// Renders the resume as PDF bytes.
pub fn render_pdf(resume: &ResumeRecord) -> Result<Vec<u8>> {
    let lines = layout(resume);
    let pages = paginate(&lines);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular_id,
            "F2" => bold_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for page_lines in &pages {
        let content = page_content(page_lines);
        let encoded = content.encode().context("Failed to encode PDF page content")?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id: ObjectId = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).context("Failed to write PDF")?;
    Ok(bytes)
}

fn page_content(lines: &[(f32, &Line)]) -> Content {
    let mut operations = Vec::with_capacity(lines.len() * 5);
    for (y, line) in lines {
        let x = MARGIN + line.style.indent();
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new(
            "Tf",
            vec![line.style.font().into(), line.style.size().into()],
        ));
        operations.push(Operation::new("Td", vec![x.into(), (*y).into()]));
        operations.push(Operation::new(
            "Tj",
            vec![Object::string_literal(to_win_ansi(&line.text))],
        ));
        operations.push(Operation::new("ET", vec![]));
    }
    Content { operations }
}

/// Assigns baselines top-down and breaks to a new page when a line would
/// cross the bottom margin. Always yields at least one page.
fn paginate(lines: &[Line]) -> Vec<Vec<(f32, &Line)>> {
    let top = PAGE_HEIGHT - MARGIN;
    let mut pages: Vec<Vec<(f32, &Line)>> = vec![Vec::new()];
    let mut y = top;

    for line in lines {
        let current_is_empty = pages.last().map_or(true, |p| p.is_empty());
        let gap = if current_is_empty { 0.0 } else { line.space_before };
        let mut baseline = y - gap - line.style.leading();
        if baseline < MARGIN && !current_is_empty {
            pages.push(Vec::new());
            baseline = top - line.style.leading();
        }
        if let Some(page) = pages.last_mut() {
            page.push((baseline, line));
        }
        y = baseline;
    }
    pages
}

fn layout(resume: &ResumeRecord) -> Vec<Line> {
    let mut lines = Vec::new();
    let info = &resume.personal_info;

    push_wrapped(&mut lines, Style::Title, resume.display_name(), 0.0);
    let contact: Vec<&str> = [&info.email, &info.phone, &info.location]
        .into_iter()
        .filter_map(|v| v.as_deref())
        .filter(|v| !v.trim().is_empty())
        .collect();
    if !contact.is_empty() {
        push_wrapped(&mut lines, Style::Body, &contact.join("  |  "), 2.0);
    }
    let links: Vec<&str> = [&info.linkedin, &info.github, &info.portfolio]
        .into_iter()
        .filter_map(|v| v.as_deref())
        .filter(|v| !v.trim().is_empty())
        .collect();
    if !links.is_empty() {
        push_wrapped(&mut lines, Style::Body, &links.join("  |  "), 0.0);
    }
    if let Some(summary) = non_empty(&resume.summary) {
        push_wrapped(&mut lines, Style::Body, summary, 8.0);
    }

    if !resume.education.is_empty() {
        heading(&mut lines, "Education");
        for edu in &resume.education {
            let title = join_present(&[&edu.institution, &edu.graduation_date], " — ");
            push_wrapped(&mut lines, Style::Body, &title, 4.0);
            let detail = join_present(&[&edu.degree, &edu.gpa.as_ref().map(|g| format!("GPA {g}"))], ", ");
            if !detail.is_empty() {
                push_wrapped(&mut lines, Style::Body, &detail, 0.0);
            }
        }
    }

    if !resume.experience.is_empty() {
        heading(&mut lines, "Experience");
        for exp in &resume.experience {
            let title = join_present(&[&exp.company, &exp.duration], " — ");
            push_wrapped(&mut lines, Style::Body, &title, 4.0);
            let role = join_present(&[&exp.position, &exp.location], ", ");
            if !role.is_empty() {
                push_wrapped(&mut lines, Style::Body, &role, 0.0);
            }
            for resp in &exp.responsibilities {
                push_wrapped(&mut lines, Style::Bullet, &format!("• {resp}"), 0.0);
            }
        }
    }

    if !resume.projects.is_empty() {
        heading(&mut lines, "Projects");
        for project in &resume.projects {
            push_wrapped(
                &mut lines,
                Style::Body,
                non_empty(&project.name).unwrap_or("Untitled project"),
                4.0,
            );
            if let Some(description) = non_empty(&project.description) {
                push_wrapped(&mut lines, Style::Bullet, description, 0.0);
            }
            if !project.technologies.is_empty() {
                let tech = format!("Technologies: {}", project.technologies.join(", "));
                push_wrapped(&mut lines, Style::Bullet, &tech, 0.0);
            }
        }
    }

    let categories = resume.skills.categories();
    if !categories.is_empty() {
        heading(&mut lines, "Skills");
        for (label, items) in categories {
            push_wrapped(
                &mut lines,
                Style::Body,
                &format!("{label}: {}", items.join(", ")),
                0.0,
            );
        }
    }

    if !resume.achievements.is_empty() {
        heading(&mut lines, "Achievements");
        for achievement in &resume.achievements {
            push_wrapped(&mut lines, Style::Bullet, &format!("• {achievement}"), 0.0);
        }
    }

    lines
}

fn heading(lines: &mut Vec<Line>, title: &str) {
    push_wrapped(lines, Style::Heading, title, 12.0);
}

fn push_wrapped(lines: &mut Vec<Line>, style: Style, text: &str, space_before: f32) {
    let usable = PAGE_WIDTH - 2.0 * MARGIN - style.indent();
    let max_chars = (usable / (style.size() * AVG_GLYPH_WIDTH)).floor().max(10.0) as usize;
    for (i, wrapped) in wrap(text, max_chars).into_iter().enumerate() {
        lines.push(Line {
            style,
            text: wrapped,
            space_before: if i == 0 { space_before } else { 0.0 },
        });
    }
}

/// Greedy word wrap by character count. Words longer than a line are split.
fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if current_len > 0 {
                out.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = word.split_off(max_chars);
            out.push(word.into_iter().collect());
            word = rest;
        }
        let needed = if current_len == 0 { word.len() } else { current_len + 1 + word.len() };
        if needed > max_chars && current_len > 0 {
            out.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.extend(word.iter());
        current_len += word.len();
    }
    if current_len > 0 || out.is_empty() {
        out.push(current);
    }
    out
}

/// Maps text onto the single-byte WinAnsi range of the base-14 fonts.
fn to_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '•' => 0x95,
            '—' => 0x97,
            '–' => 0x96,
            '‘' | '’' => b'\'',
            '“' | '”' => b'"',
            c if (c as u32) < 0x80 => c as u8,
            c if (0xA0..=0xFF).contains(&(c as u32)) => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn join_present(parts: &[&Option<String>], sep: &str) -> String {
    parts
        .iter()
        .filter_map(|p| non_empty(p))
        .collect::<Vec<_>>()
        .join(sep)
}
