fn main() {
    overlay_scoreboard_lib::run()
}
