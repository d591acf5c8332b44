use llgen::{
    codegen::{DefaultGenerator, ExternalTokenizer, GenerationError, Placeholder, TemplateError},
    grammar::{Grammar, GrammarError},
};
use llgen_python::PythonAdapter;
use std::{env, fs, path::PathBuf, process::Command};

fn fixture(name: &str) -> Grammar {
    Grammar::from_file(
        PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap())
            .join(format!("../llgen/tests/{}.llg", name)),
    )
    .unwrap()
}

fn generate(name: &str) -> String {
    DefaultGenerator::new(PythonAdapter::default())
        .generate(&fixture(name))
        .unwrap()
}

#[test]
fn calc() {
    let output = generate("calc");
    eprintln!("{}", output);

    assert!(!output.contains("{{{"));
    assert!(output.contains("\nimport operator\n"));
    assert!(output.contains(
        "def _handler0(_1, _2):\n    __ = None\n    __ = fold(_1, _2)\n    return __\n"
    ));
    assert!(output.contains("def _lex_rule7():\n    global yytext\n    yytext = float(yytext)\n"));
    assert!(output.contains("_productions = [['Expr', ['Term', 'ExprTail'], _handler0], "));
    assert!(output.contains("['Factor', ['NUMBER'], None]"));
    assert!(output.contains("_table = {\n    'Expr': {"));
    assert!(output.contains("    'ExprTail': {'+': 1, '-': 2, "));
    assert!(output.contains("['\\\\+', '+', None]"));
    assert!(output.contains("['\\\\s+', None, None]"));
    assert!(output.contains("'custom_tokenizer': False"));
}

#[test]
fn deterministic() {
    assert_eq!(generate("json"), generate("json"));
}

#[test]
fn external_tokenizer() {
    let tokenizer = "\
class Tokenizer(object):
    def __init__(self, string):
        self._tokens = iter(string.split())

    def get_next_token(self):
        return next(self._tokens, (EOF, None))
";
    let mut generator = DefaultGenerator::new(PythonAdapter::default());
    generator.tokenizer(ExternalTokenizer::new(tokenizer));
    let output = generator.generate(&fixture("calc")).unwrap();

    assert!(output.contains(tokenizer));
    assert!(!output.contains("_lex_rules"));
    assert!(!output.contains("def _lex_rule"));
    assert!(output.contains("'custom_tokenizer': True"));
}

#[test]
fn template_without_table() {
    let adapter = PythonAdapter::with_template(llgen_python::TEMPLATE.replace("{{{TABLE}}}", "{}"));
    let err = DefaultGenerator::new(adapter)
        .generate(&fixture("calc"))
        .unwrap_err();
    assert!(matches!(
        err,
        GenerationError::Template(TemplateError::MissingPlaceholder(Placeholder::Table))
    ));
}

#[test]
fn positional_out_of_range() {
    let err = DefaultGenerator::new(PythonAdapter::default())
        .generate_from_source(
            r#"
@terminal NUM;
@rule Pair := NUM NUM %{ $$ = ($1, $3) %};
"#,
        )
        .unwrap_err();
    assert!(
        matches!(
            err,
            GenerationError::Grammar(GrammarError::InvalidPositional { ref reference, .. })
                if reference == "$3"
        ),
        "{:?}",
        err
    );
}

/// Run the generated parsers if a Python interpreter is available.
#[test]
fn run_generated_parsers() {
    let python = env::var("PYTHON").unwrap_or_else(|_| "python3".into());
    if Command::new(&python).arg("--version").output().is_err() {
        eprintln!("skipped: {} is not available", python);
        return;
    }

    let dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("llgen-python");
    fs::create_dir_all(&dir).unwrap();
    for name in ["calc", "json", "statements"] {
        fs::write(dir.join(format!("{}_parser.py", name)), generate(name)).unwrap();
    }

    let run = |script: &str| {
        let output = Command::new(&python)
            .arg("-c")
            .arg(script)
            .current_dir(&dir)
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "{}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout).unwrap()
    };

    assert_eq!(
        run("import calc_parser; print(calc_parser.parse('1 + 2 * (3 - 1) / -2'))").trim(),
        "-1.0"
    );
    assert_eq!(
        run(r#"import json_parser; print(json_parser.parse('{"a": [1, true, null], "b": "x"}'))"#)
            .trim(),
        "{'a': [1.0, True, None], 'b': 'x'}"
    );
    assert_eq!(
        run("import statements_parser as p; print(p.parse('let letter := 1; print letter == 1;'))")
            .trim(),
        "[('let', 'letter', 1), ('print', ('==', 'letter', 1))]"
    );
    assert_eq!(
        run("\
import calc_parser
try:
    calc_parser.parse('1 +')
except calc_parser.ParseError:
    print('error')
")
        .trim(),
        "error"
    );
}
