//! Terminal output for autocomplete suggestions and catalog browsing

use crate::catalog::{CuisinePage, FilterOptions, RestaurantPage, RestaurantSummary};
use crate::query::{AutocompleteResponse, ResultItem};
use std::io::{self, IsTerminal, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

fn stdout(color: bool) -> StandardStream {
    // Piped output stays plain
    let choice = if color && io::stdout().is_terminal() {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    StandardStream::stdout(choice)
}

/// Print suggestions one per line, cuisines tagged and restaurants with location
pub fn print_suggestions(response: &AutocompleteResponse, query: &str, color: bool) -> io::Result<()> {
    let mut out = stdout(color);
    write_suggestions(&mut out, response, query)
}

pub fn write_suggestions<W: WriteColor>(
    out: &mut W,
    response: &AutocompleteResponse,
    query: &str,
) -> io::Result<()> {
    let needle = query.to_lowercase();

    for item in &response.data {
        match item {
            ResultItem::Cuisine { name } => {
                out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)))?;
                write!(out, "cuisine     ")?;
                out.reset()?;
                write_highlighted(out, name, &needle)?;
                writeln!(out)?;
            }
            ResultItem::Restaurant(entry) => {
                out.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)))?;
                write!(out, "restaurant  ")?;
                out.reset()?;
                write_highlighted(out, &entry.name, &needle)?;

                if !entry.location.is_empty() {
                    out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
                    write!(out, "  {}", entry.location)?;
                    out.reset()?;
                }
                if !entry.rating.is_empty() {
                    out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
                    write!(out, "  {}", entry.rating)?;
                    out.reset()?;
                }
                writeln!(out)?;
            }
        }
    }

    Ok(())
}

/// Write `text`, bolding the first case-insensitive occurrence of `needle_lower`
fn write_highlighted<W: WriteColor>(out: &mut W, text: &str, needle_lower: &str) -> io::Result<()> {
    match find_ignore_case(text, needle_lower) {
        Some((start, end)) => {
            write!(out, "{}", &text[..start])?;
            out.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
            write!(out, "{}", &text[start..end])?;
            out.reset()?;
            write!(out, "{}", &text[end..])
        }
        None => write!(out, "{}", text),
    }
}

/// Byte range of the first match, on char boundaries of `text`
fn find_ignore_case(text: &str, needle_lower: &str) -> Option<(usize, usize)> {
    if needle_lower.is_empty() {
        return None;
    }

    let needle_chars = needle_lower.chars().count();
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();

    for window_start in 0..boundaries.len().saturating_sub(needle_chars) {
        let start = boundaries[window_start];
        let end = boundaries[window_start + needle_chars];
        if text[start..end].to_lowercase() == needle_lower {
            return Some((start, end));
        }
    }

    None
}

/// Print one page of restaurants serving a cuisine
pub fn print_cuisine_page(page: &CuisinePage, cuisine: &str, color: bool) -> io::Result<()> {
    let mut out = stdout(color);

    out.set_color(ColorSpec::new().set_bold(true))?;
    writeln!(
        out,
        "{} restaurants serving '{}' (page {} of {})",
        page.total_records,
        cuisine,
        page.current_page,
        page.total_pages.max(1)
    )?;
    out.reset()?;

    for summary in &page.data {
        write_summary(&mut out, summary)?;
    }

    Ok(())
}

/// Print one page of the restaurant listing
pub fn print_restaurant_page(page: &RestaurantPage, color: bool) -> io::Result<()> {
    let mut out = stdout(color);

    out.set_color(ColorSpec::new().set_bold(true))?;
    writeln!(
        out,
        "{} restaurants (page {} of {})",
        page.total,
        page.page,
        page.total.div_ceil(page.limit.max(1)).max(1)
    )?;
    out.reset()?;

    for (offset, record) in page.data.iter().enumerate() {
        let position = page.page.saturating_sub(1) * page.limit + offset;
        let summary = RestaurantSummary::from_record(record, position);
        write_summary(&mut out, &summary)?;
        if !record.rest_type.is_empty() {
            writeln!(out, "    {}", record.rest_type)?;
        }
    }

    Ok(())
}

fn write_summary<W: WriteColor>(out: &mut W, summary: &RestaurantSummary) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)).set_bold(true))?;
    write!(out, "{}", summary.name)?;
    out.reset()?;

    out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
    write!(out, "  {}", summary.location)?;
    out.reset()?;

    out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
    write!(out, "  {} ({} votes)", summary.rate, summary.votes)?;
    out.reset()?;
    writeln!(out)?;

    writeln!(out, "    {}", summary.cuisines)
}

/// Print the distinct values of each filter
pub fn print_filter_options(options: &FilterOptions, color: bool) -> io::Result<()> {
    let mut out = stdout(color);

    let flags = |values: &[bool]| {
        values
            .iter()
            .map(|v| if *v { "yes" } else { "no" })
            .collect::<Vec<_>>()
            .join(", ")
    };

    let sections: [(&str, String); 2] = [
        ("Online order", flags(&options.online_order)),
        ("Book table", flags(&options.book_table)),
    ];
    for (label, values) in &sections {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
        write!(out, "{}: ", label)?;
        out.reset()?;
        writeln!(out, "{}", values)?;
    }

    for (label, values) in [
        ("Locations", &options.location),
        ("Restaurant types", &options.rest_type),
        ("Cuisines", &options.cuisines),
    ] {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
        writeln!(out, "{} ({}):", label, values.len())?;
        out.reset()?;
        for value in values {
            writeln!(out, "  {}", value)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::types::EntityEntry;
    use termcolor::NoColor;

    #[test]
    fn test_find_ignore_case() {
        assert_eq!(find_ignore_case("Cafe Coffee Day", "coffee"), Some((5, 11)));
        assert_eq!(find_ignore_case("Pizza", "xyz"), None);
        assert_eq!(find_ignore_case("Pizza", ""), None);
        // Multi-byte prefix keeps char boundaries
        assert_eq!(find_ignore_case("Ç Café", "café"), Some((3, 8)));
    }

    #[test]
    fn test_write_suggestions_plain() {
        let response = AutocompleteResponse::from_items(
            vec![
                ResultItem::Cuisine { name: "Pizza".to_string() },
                ResultItem::Restaurant(EntityEntry {
                    id: "1".to_string(),
                    name: "Pizza Hut".to_string(),
                    location: "BTM".to_string(),
                    rating: "3.9/5".to_string(),
                    ..Default::default()
                }),
            ],
            10,
        );

        let mut out = NoColor::new(Vec::new());
        write_suggestions(&mut out, &response, "piz").unwrap();
        let text = String::from_utf8(out.into_inner()).unwrap();

        assert_eq!(
            text,
            "cuisine     Pizza\nrestaurant  Pizza Hut  BTM  3.9/5\n"
        );
    }
}
