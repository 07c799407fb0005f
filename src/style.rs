//! Terminal styling utilities
//!
//! Provides a consistent color scheme across all CLI commands:
//! - Semantic colors for status (green/yellow/red)
//! - Cyan for headers and technical terms
//! - Bold for important identifiers
//! - Dim for secondary information

use crossterm::style::Stylize;

/// Extension trait for consistent devprof styling
///
/// Extends crossterm's `Stylize` with semantic styling methods that enforce
/// the color scheme. Use these instead of direct color calls so all command
/// output stays visually consistent.
///
/// # Examples
///
/// ```
/// use crossterm::style::Stylize;
/// use devprof::style::DevprofStyle;
///
/// println!("{}", "MONITORS:".header());
/// println!("{}", "active".success());
/// println!("{}", "\\\\.\\DISPLAY1".technical());
/// ```
pub trait DevprofStyle: Stylize {
    /// Style for section headers (cyan bold)
    fn header(self) -> <<Self as Stylize>::Styled as Stylize>::Styled
    where
        Self: Sized,
        <Self as Stylize>::Styled: Stylize,
    {
        self.cyan().bold()
    }

    /// Style for success/active status (green)
    fn success(self) -> <Self as Stylize>::Styled
    where
        Self: Sized,
    {
        self.green()
    }

    /// Style for error/missing status (red)
    fn error(self) -> <Self as Stylize>::Styled
    where
        Self: Sized,
    {
        self.red()
    }

    /// Style for warning/partial status (yellow)
    fn warning(self) -> <Self as Stylize>::Styled
    where
        Self: Sized,
    {
        self.yellow()
    }

    /// Style for technical terms and identifiers (cyan)
    ///
    /// Use for device handles, endpoint ids, paths, counts.
    fn technical(self) -> <Self as Stylize>::Styled
    where
        Self: Sized,
    {
        self.cyan()
    }
}

// Implement for all types that implement Stylize (String, &str, etc.)
impl<T: Stylize> DevprofStyle for T {}
