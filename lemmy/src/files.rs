use crate::context::Context;
use crate::error::AppError;
use log::{info, warn};
use std::fs::{self, File};
use std::io::{self, BufRead, BufWriter, Write};
use std::path::Path;

const DOTS_EVERY: usize = 50;

/// Lemmatize `input` into `output`. Both must be files, or both folders.
pub async fn run(context: &Context, input: &Path, output: &Path) -> Result<(), AppError> {
    let input_meta = fs::metadata(input).map_err(AppError::io(input))?;
    let output_meta = match fs::metadata(output) {
        Ok(meta) => Some(meta),
        Err(err) if err.kind() == io::ErrorKind::NotFound => None,
        Err(err) => return Err(AppError::io(output)(err)),
    };

    if let Some(output_meta) = &output_meta {
        if output_meta.is_dir() != input_meta.is_dir() {
            return Err(AppError::KindMismatch);
        }
    }

    if !input_meta.is_dir() {
        return lemmatize_file(context, input, output).await;
    }

    if output_meta.is_none() {
        fs::create_dir_all(output).map_err(AppError::io(output))?;
    }

    let mut entries = fs::read_dir(input)
        .map_err(AppError::io(input))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(AppError::io(input))?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let path = entry.path();
        if !path.is_file() {
            warn!("Skipping '{}': not a regular file", path.display());
            continue;
        }
        lemmatize_file(context, &path, &output.join(entry.file_name())).await?;
    }

    Ok(())
}

async fn lemmatize_file(context: &Context, input: &Path, output: &Path) -> Result<(), AppError> {
    if output.exists() && !ask_overwrite(output).await.map_err(AppError::io(output))? {
        info!("Leaving '{}' untouched", output.display());
        return Ok(());
    }

    // The whole file is read up front; the lemmatizer tokenizes it lazily.
    let bytes = tokio::fs::read(input).await.map_err(AppError::io(input))?;
    let text = String::from_utf8_lossy(&bytes).into_owned();
    let file = File::create(output).map_err(AppError::io(output))?;

    print!("Lemmatizing '{}' into '{}'", input.display(), output.display());
    let _ = io::stdout().flush();

    let reader = context.lemmatizer().lemmatize_text(text);
    let count = write_lemmas(reader, BufWriter::new(file), &mut io::stdout())
        .await
        .map_err(|err| match err {
            WriteError::Io(source) => AppError::io(output)(source),
            WriteError::Lemmatizer(err) => AppError::Lemmatizer(err),
        })?;
    println!();

    info!("Wrote {} lemmas to '{}'", count, output.display());
    Ok(())
}

#[derive(Debug)]
enum WriteError {
    Io(io::Error),
    Lemmatizer(lemma_client::Error),
}

impl From<io::Error> for WriteError {
    fn from(err: io::Error) -> Self {
        WriteError::Io(err)
    }
}

/// Write each lemma followed by a space, then a final newline. Prints a
/// progress dot to `progress` every fifty lemmas.
async fn write_lemmas<W: Write, P: Write>(
    mut reader: lemma_client::LemmaReader,
    mut out: W,
    progress: &mut P,
) -> Result<usize, WriteError> {
    let mut count = 0;
    while let Some(lemma) = reader.next().await {
        let lemma = lemma.map_err(WriteError::Lemmatizer)?;
        write!(out, "{} ", lemma)?;
        count += 1;
        if count % DOTS_EVERY == 0 {
            write!(progress, ".")?;
            progress.flush()?;
        }
    }
    writeln!(out)?;
    out.flush()?;
    Ok(count)
}

/// Prompt on the terminal without blocking the runtime.
async fn ask_overwrite(output: &Path) -> io::Result<bool> {
    let path = output.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let stdin = io::stdin();
        confirm_overwrite(&path, &mut stdin.lock(), &mut io::stdout())
    })
    .await
    .map_err(io::Error::other)?
}

/// Ask until the answer is y or n. End of input counts as "no".
fn confirm_overwrite<R: BufRead, W: Write>(
    path: &Path,
    answers: &mut R,
    prompt: &mut W,
) -> io::Result<bool> {
    write!(prompt, "WARNING: ")?;
    loop {
        write!(
            prompt,
            "File '{}' already exists. Overwrite? (y/n): ",
            path.display()
        )?;
        prompt.flush()?;

        let mut answer = String::new();
        if answers.read_line(&mut answer)? == 0 {
            writeln!(prompt)?;
            return Ok(false);
        }

        match answer.trim() {
            "y" | "Y" => return Ok(true),
            "n" | "N" => return Ok(false),
            _ => writeln!(prompt, "Invalid Input.")?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use async_trait::async_trait;
    use lemma_client::{LemmaLookup, Lemmatizer, LemmatizerConfig, LookupError};
    use std::io::Cursor;
    use std::sync::Arc;
    use tempdir::TempDir;

    struct Dictionary;

    #[async_trait]
    impl LemmaLookup for Dictionary {
        async fn lookup(&self, word: &str) -> Result<Option<String>, LookupError> {
            Ok(match word {
                "et" => Some("et".to_string()),
                "oratio" => Some("oratio".to_string()),
                "conviciis" => Some("convicium".to_string()),
                "est" => Some("sum".to_string()),
                _ => None,
            })
        }
    }

    fn context() -> Context {
        let lemmatizer =
            Lemmatizer::with_lookup(LemmatizerConfig::default(), Arc::new(Dictionary)).unwrap();
        Context::with_lemmatizer(lemmatizer, Settings::default())
    }

    #[test]
    fn test_confirm_overwrite_reasks_until_valid() {
        let mut answers = Cursor::new("maybe\nY\n");
        let mut prompt = vec![];

        let confirmed = confirm_overwrite(Path::new("out.txt"), &mut answers, &mut prompt).unwrap();

        assert!(confirmed);
        let prompt = String::from_utf8(prompt).unwrap();
        assert!(prompt.starts_with("WARNING: File 'out.txt' already exists. Overwrite? (y/n): "));
        assert_eq!(prompt.matches("Invalid Input.").count(), 1);
        assert_eq!(prompt.matches("Overwrite?").count(), 2);
    }

    #[test]
    fn test_confirm_overwrite_declined() {
        let mut prompt = vec![];
        assert!(!confirm_overwrite(Path::new("a"), &mut Cursor::new("n\n"), &mut prompt).unwrap());
        assert!(!confirm_overwrite(Path::new("a"), &mut Cursor::new(""), &mut prompt).unwrap());
    }

    #[tokio::test]
    async fn test_lemmas_written_space_separated_with_progress() {
        let context = context();
        let text = "et oratio ".repeat(60);
        let mut out = vec![];
        let mut progress = vec![];

        let count = write_lemmas(
            context.lemmatizer().lemmatize_text(text),
            &mut out,
            &mut progress,
        )
        .await
        .unwrap();

        assert_eq!(count, 120);
        assert_eq!(progress, b"..");
        let written = String::from_utf8(out).unwrap();
        assert!(written.starts_with("et oratio et oratio "));
        assert!(written.ends_with("oratio \n"));
    }

    #[tokio::test]
    async fn test_single_file() {
        let dir = TempDir::new("lemmy").unwrap();
        let input = dir.path().join("in.txt");
        let output = dir.path().join("out.txt");
        fs::write(&input, "Et oratio, conviciis est; ignotum.").unwrap();

        run(&context(), &input, &output).await.unwrap();

        // "Et" is not in the dictionary, only "et" is
        assert_eq!(fs::read_to_string(&output).unwrap(), "oratio convicium sum \n");
    }

    #[tokio::test]
    async fn test_non_utf8_input_is_read_lossily() {
        let dir = TempDir::new("lemmy").unwrap();
        let input = dir.path().join("in.txt");
        let output = dir.path().join("out.txt");
        fs::write(&input, b"et \xff\xfe est").unwrap();

        run(&context(), &input, &output).await.unwrap();

        assert_eq!(fs::read_to_string(&output).unwrap(), "et sum \n");
    }

    #[tokio::test]
    async fn test_folder_creates_output_and_mirrors_names() {
        let dir = TempDir::new("lemmy").unwrap();
        let input = dir.path().join("texts");
        let output = dir.path().join("lemmas");
        fs::create_dir(&input).unwrap();
        fs::create_dir(input.join("nested")).unwrap();
        fs::write(input.join("a.txt"), "et est").unwrap();
        fs::write(input.join("b.txt"), "conviciis").unwrap();

        run(&context(), &input, &output).await.unwrap();

        assert_eq!(fs::read_to_string(output.join("a.txt")).unwrap(), "et sum \n");
        assert_eq!(fs::read_to_string(output.join("b.txt")).unwrap(), "convicium \n");
        assert!(!output.join("nested").exists());
    }

    #[tokio::test]
    async fn test_file_into_folder_is_rejected() {
        let dir = TempDir::new("lemmy").unwrap();
        let input = dir.path().join("in.txt");
        fs::write(&input, "et").unwrap();

        let result = run(&context(), &input, dir.path()).await;

        assert!(matches!(result, Err(AppError::KindMismatch)));
    }

    #[tokio::test]
    async fn test_missing_input_is_an_io_error() {
        let dir = TempDir::new("lemmy").unwrap();

        let result = run(&context(), &dir.path().join("missing"), &dir.path().join("out")).await;

        assert!(matches!(result, Err(AppError::Io { .. })));
    }
}
