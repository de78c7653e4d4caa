use keymap::KeyMap;

#[derive(KeyMap, Clone, Copy, Debug, PartialEq)]
pub enum Action {
    /// Quit the application
    #[key("q")]
    Quit,
    /// Reset the machine to its initial tape and state
    #[key("r")]
    Reset,
    /// Execute one instruction
    #[key("space")]
    Step,
    /// Toggle auto-play
    #[key("p")]
    ToggleAutoPlay,
    /// Toggle help display
    #[key("h")]
    ToggleHelp,
    /// Scroll the program source up
    #[key("up")]
    ScrollUp,
    /// Scroll the program source down
    #[key("down")]
    ScrollDown,
}
