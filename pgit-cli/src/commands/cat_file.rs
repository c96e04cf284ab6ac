use anyhow::Result;
use std::io::Write;
use std::path::Path;

pub fn run(base: &Path, object: &str, kind_only: bool) -> Result<()> {
    let repo = super::open_repo(base)?;
    let (_, object) = repo.cat_file(object)?;

    if kind_only {
        println!("{}", object.kind);
    } else {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(&object.data)?;
        stdout.flush()?;
    }

    Ok(())
}
