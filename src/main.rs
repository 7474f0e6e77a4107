fn main() -> anyhow::Result<()> {
    leadbox::run()?;
    Ok(())
}
