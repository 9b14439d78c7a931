//! Console prompts for `generate --interactive`.

use std::io::{self, BufRead, Write};

use jigsaw_synth::batch::BatchMode;

/// Answers collected from the console.
pub struct Answers {
    pub mode: BatchMode,
    pub lighting: bool,
    pub camera: bool,
    pub copy_base: bool,
}

/// Ask for batch mode, counts and the randomization switches.
pub fn ask(num_bases: usize) -> io::Result<Answers> {
    let stdin = io::stdin();
    let mut input = stdin.lock();

    let total_mode = ask_yes_no(
        &mut input,
        "Draw a total number of random samples instead of a count per base?",
        false,
    )?;
    let mode = if total_mode {
        BatchMode::TotalRandom {
            total: ask_count(&mut input, "Total samples:")?,
        }
    } else {
        let prompt = format!("Images per base: (there are {} bases)", num_bases);
        BatchMode::PerBase {
            per_base: ask_count(&mut input, &prompt)?,
        }
    };

    let lighting = ask_yes_no(&mut input, "Randomize lighting?", true)?;
    let camera = ask_yes_no(&mut input, "Randomize camera?", true)?;
    let copy_base = !total_mode && ask_yes_no(&mut input, "Copy base images to output?", true)?;

    Ok(Answers {
        mode,
        lighting,
        camera,
        copy_base,
    })
}

fn read_line<R: BufRead>(input: &mut R, prompt: &str) -> io::Result<String> {
    print!("{} ", prompt);
    io::stdout().flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "no more input"));
    }
    Ok(line.trim().to_string())
}

fn ask_count<R: BufRead>(input: &mut R, prompt: &str) -> io::Result<usize> {
    loop {
        match read_line(input, prompt)?.parse() {
            Ok(n) => return Ok(n),
            Err(_) => println!("Please enter a whole number."),
        }
    }
}

fn ask_yes_no<R: BufRead>(input: &mut R, prompt: &str, default: bool) -> io::Result<bool> {
    let hint = if default { "[Y/n]" } else { "[y/N]" };
    loop {
        let answer = read_line(input, &format!("{} {}", prompt, hint))?;
        match answer.to_lowercase().as_str() {
            "" => return Ok(default),
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => println!("Please answer y or n."),
        }
    }
}
