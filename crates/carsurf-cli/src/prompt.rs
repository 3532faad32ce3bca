use std::io::{self, BufRead, Write};

use carsurf_crawler::SearchFilter;

pub fn ask<R, W>(input: &mut R, output: &mut W, question: &str) -> io::Result<String>
where
    R: BufRead,
    W: Write,
{
    write!(output, "{question}: ")?;
    output.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(answer.trim().to_string())
}

/// Asks for radius, zip code and result limit, in that order.
pub fn ask_filter<R, W>(input: &mut R, output: &mut W) -> anyhow::Result<SearchFilter>
where
    R: BufRead,
    W: Write,
{
    let radius = ask(input, output, "Enter your radius")?;
    let zip = ask(input, output, "Enter your zip code")?;
    let limit = ask(input, output, "Enter your result limit")?;
    Ok(SearchFilter::from_answers(&radius, &zip, &limit)?)
}
