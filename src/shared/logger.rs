/***************************************/
/*        3rd party libraries          */
/***************************************/
use ansi_term::Colour;
use log::info;

/***************************************/
/*             Public API              */
/***************************************/

/**
 * Writes one simulation event line, painted in `colour` when given.
 *
 * Goes through the `log` facade, so a missing or failing logger only loses
 * the line and never reaches back into the simulation.
 */
pub fn print(message: &str, colour: Option<Colour>) {
    match colour {
        Some(colour) => info!("{}", colour.paint(message)),
        None => info!("{}", message),
    }
}
