fn main() -> anyhow::Result<()> {
    portal_scene::run()
}
